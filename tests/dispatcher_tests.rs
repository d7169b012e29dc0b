// Integration tests for per-user serialization
//
// These tests verify that one user's events never interleave, that different users
// proceed independently, and that idle workers retire without losing state.

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common::{clip, dispatcher, dispatcher_with, event, fragment, idle_config, user};
use tempfile::TempDir;
use tokio::sync::{mpsc, Mutex};
use voice_stitch::{EventKind, Gateway, OutboundInstruction, Replies, UserId};

/// Gateway that records every delivery
#[derive(Default)]
struct RecordingGateway {
    delivered: Mutex<Vec<(UserId, OutboundInstruction)>>,
}

#[async_trait::async_trait]
impl Gateway for RecordingGateway {
    async fn deliver(&self, user_id: &UserId, instruction: OutboundInstruction) -> Result<()> {
        self.delivered.lock().await.push((user_id.clone(), instruction));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

impl RecordingGateway {
    async fn wait_for(&self, count: usize) -> Vec<(UserId, OutboundInstruction)> {
        for _ in 0..500 {
            {
                let delivered = self.delivered.lock().await;
                if delivered.len() >= count {
                    return delivered.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {} deliveries", count);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_fragments_for_one_user_are_serialized() -> Result<()> {
    let dir = TempDir::new()?;
    let dispatcher = dispatcher(&dir);
    let store = dispatcher.controller().store().clone();
    let lena = user("2001");
    let replies = Replies::default();

    let (a, b, c) = tokio::join!(
        dispatcher.submit(fragment(&lena, "a", clip(25))),
        dispatcher.submit(fragment(&lena, "b", clip(25))),
        dispatcher.submit(fragment(&lena, "c", clip(25))),
    );

    let replies_text: Vec<String> = [a?, b?, c?].into_iter().map(|r| r.reply_text).collect();
    let saved = replies_text
        .iter()
        .filter(|text| **text == replies.fragment_saved(25))
        .count();

    assert_eq!(saved, 2, "Exactly two 25s fragments fit in 60s: {:?}", replies_text);

    let session = store.get(&lena).await.unwrap();
    assert_eq!(session.accumulated_seconds, 50);
    assert_eq!(session.fragment_count, 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_users_are_independent() -> Result<()> {
    let dir = TempDir::new()?;
    let dispatcher = dispatcher(&dir);
    let store = dispatcher.controller().store().clone();
    let (mia, noah) = (user("2002"), user("2003"));

    let (first, second) = tokio::join!(
        dispatcher.submit(fragment(&mia, "m", clip(40))),
        dispatcher.submit(fragment(&noah, "n", clip(40))),
    );
    first?;
    second?;

    assert_eq!(store.remaining_budget(&mia).await, 20);
    assert_eq!(store.remaining_budget(&noah).await, 20);
    assert_eq!(dispatcher.active_workers().await, 2);

    Ok(())
}

#[tokio::test]
async fn test_idle_workers_retire_and_state_survives() -> Result<()> {
    let dir = TempDir::new()?;
    let dispatcher = dispatcher_with(idle_config(&dir, Duration::from_millis(50)));
    let store = dispatcher.controller().store().clone();
    let olga = user("2004");

    dispatcher.submit(fragment(&olga, "a", clip(10))).await?;
    assert_eq!(dispatcher.active_workers().await, 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(dispatcher.active_workers().await, 0);

    dispatcher.submit(fragment(&olga, "b", clip(10))).await?;
    assert_eq!(store.remaining_budget(&olga).await, 40);

    Ok(())
}

#[tokio::test]
async fn test_run_delivers_in_arrival_order() -> Result<()> {
    let dir = TempDir::new()?;
    let dispatcher = dispatcher(&dir);
    let gateway = Arc::new(RecordingGateway::default());
    let replies = Replies::default();
    let pete = user("2005");

    let (tx, rx) = mpsc::channel(16);
    let runner = {
        let dispatcher = Arc::clone(&dispatcher);
        let gateway: Arc<dyn Gateway> = gateway.clone();
        tokio::spawn(async move { dispatcher.run(gateway, rx).await })
    };

    tx.send(event(&pete, EventKind::Start)).await?;
    tx.send(fragment(&pete, "a", clip(20))).await?;
    tx.send(event(&pete, EventKind::AddMorePrompt)).await?;
    tx.send(event(&pete, EventKind::ListenRequest)).await?;
    drop(tx);

    let delivered = gateway.wait_for(4).await;
    runner.await?;

    let texts: Vec<&str> = delivered.iter().map(|(_, i)| i.reply_text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            replies.record_prompt(60).as_str(),
            replies.fragment_saved(20).as_str(),
            replies.record_prompt(40).as_str(),
            replies.result_caption.as_str(),
        ]
    );
    assert!(delivered.iter().all(|(id, _)| *id == pete));
    assert!(delivered[3].1.artifact.is_some());

    Ok(())
}
