use super::*;
use crate::fork::{Fork, ForkKey};
use std::time::Duration;

fn key(a: u32, b: u32) -> ForkKey {
    ForkKey::new(AgentId(a), AgentId(b)).unwrap()
}

#[tokio::test]
async fn drain_all_returns_messages_in_send_order() {
    let (tx, mut mailbox) = Mailbox::channel(AgentId(1));

    tx.send(Message::request(AgentId(0), key(0, 1))).unwrap();
    tx.send(Message::grant(AgentId(2), Fork::new(key(1, 2)))).unwrap();

    let drained = mailbox.drain_all();
    assert_eq!(drained.len(), 2);
    assert_eq!(drained[0].sender(), AgentId(0));
    assert!(!drained[0].is_grant());
    assert_eq!(drained[1].sender(), AgentId(2));
    assert!(drained[1].is_grant());
    assert!(mailbox.drain_all().is_empty());
}

#[tokio::test]
async fn recv_blocks_until_a_neighbor_sends() {
    let (tx, mut mailbox) = Mailbox::channel(AgentId(0));

    let sender = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(Message::request(AgentId(1), key(0, 1))).unwrap();
    });

    let message = tokio::time::timeout(Duration::from_secs(2), mailbox.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.fork(), key(0, 1));
    sender.await.unwrap();
}

#[tokio::test]
async fn many_concurrent_senders_lose_nothing() {
    let (tx, mut mailbox) = Mailbox::channel(AgentId(0));

    let mut handles = Vec::new();
    for sender in 1..=4u32 {
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..50 {
                tx.send(Message::request(AgentId(sender), key(0, sender)))
                    .unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let drained = mailbox.drain_all();
    assert_eq!(drained.len(), 200);
    for sender in 1..=4u32 {
        let count = drained
            .iter()
            .filter(|m| m.sender() == AgentId(sender))
            .count();
        assert_eq!(count, 50);
    }
}

#[test]
fn send_to_dropped_mailbox_is_an_error() {
    let (tx, mailbox) = Mailbox::channel(AgentId(3));
    drop(mailbox);

    let err = tx.send(Message::request(AgentId(2), key(2, 3))).unwrap_err();
    assert_eq!(err, ProtocolError::MailboxClosed(AgentId(3)));
}

#[test]
fn directory_routes_by_agent_id() {
    let (tx0, mut mb0) = Mailbox::channel(AgentId(0));
    let (tx1, mut mb1) = Mailbox::channel(AgentId(1));
    let directory = Directory::new(vec![tx0, tx1]);

    directory
        .send(AgentId(1), Message::request(AgentId(0), key(0, 1)))
        .unwrap();

    assert!(mb0.drain_all().is_empty());
    assert_eq!(mb1.drain_all()[0].sender(), AgentId(0));

    let err = directory
        .send(AgentId(9), Message::request(AgentId(0), key(0, 1)))
        .unwrap_err();
    assert_eq!(err, ProtocolError::UnknownAgent(AgentId(9)));
}

#[test]
fn for_agents_creates_one_mailbox_each() {
    let (directory, mut mailboxes) = Directory::for_agents(3);
    assert_eq!(mailboxes.len(), 3);

    directory
        .send(AgentId(2), Message::request(AgentId(1), key(1, 2)))
        .unwrap();
    assert_eq!(mailboxes[2].drain_all().len(), 1);
    assert!(mailboxes[0].drain_all().is_empty());
    assert!(matches!(
        directory.send(AgentId(3), Message::request(AgentId(2), key(2, 3))),
        Err(ProtocolError::UnknownAgent(AgentId(3)))
    ));
}
