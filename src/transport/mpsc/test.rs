#[cfg(test)]
mod tests {
    use crate::error::RoomError;
    use crate::message::ClientMessage;
    use crate::registry::RoomRegistry;
    use crate::response::ServerMessage;
    use crate::role::Role;
    use crate::session::{Coordinator, SessionEnd};
    use crate::transport::mpsc::{MpscConnection, MpscTransport};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn transport() -> (MpscTransport, Arc<RoomRegistry>) {
        let registry = Arc::new(RoomRegistry::seeded(17));
        let transport = MpscTransport::new(Coordinator::new(registry.clone()));
        (transport, registry)
    }

    /// Reads messages until the connection has been quiet for a short while.
    async fn drain(connection: &mut MpscConnection) -> Vec<ServerMessage> {
        let mut received = Vec::new();
        while let Ok(Some(message)) = timeout(Duration::from_millis(150), connection.recv()).await {
            received.push(message);
        }
        received
    }

    async fn joined(transport: &MpscTransport, code: &str, name: &str) -> MpscConnection {
        let mut connection = transport.connect(code, name, 64);
        match timeout(Duration::from_secs(1), connection.recv()).await {
            Ok(Some(ServerMessage::Joined { player, .. })) => assert_eq!(player, name),
            other => panic!("expected join greeting, got {:?}", other),
        }
        connection
    }

    fn roles(messages: &[ServerMessage]) -> Vec<Role> {
        messages
            .iter()
            .filter_map(|m| match m {
                ServerMessage::Role(role) => Some(*role),
                _ => None,
            })
            .collect()
    }

    fn last_roster(messages: &[ServerMessage]) -> Option<Vec<String>> {
        messages.iter().rev().find_map(|m| match m {
            ServerMessage::UpdatePlayers(players) => Some(players.clone()),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_unknown_room_gets_notice_and_close() {
        let (transport, _) = transport();
        let mut connection = transport.connect("NOPE99", "ana", 8);

        assert_eq!(connection.recv().await, Some(ServerMessage::RoomNotFound));
        assert_eq!(connection.recv().await, None);
        assert_eq!(connection.session.await.unwrap(), SessionEnd::RoomNotFound);
    }

    #[tokio::test]
    async fn test_three_players_ready_and_start() {
        let (transport, registry) = transport();
        let room = registry.create("Viernes", 5).unwrap();

        let mut a = joined(&transport, room.code(), "A").await;
        let mut b = joined(&transport, room.code(), "B").await;
        let mut c = joined(&transport, room.code(), "C").await;

        for connection in [&a, &b, &c] {
            connection.send(ClientMessage::Ready).await.unwrap();
        }
        a.send(ClientMessage::Start).await.unwrap();

        let mut specials = 0;
        for connection in [&mut a, &mut b, &mut c] {
            let received = drain(connection).await;
            let roles = roles(&received);
            assert_eq!(roles.len(), 1, "exactly one role per player");
            if roles[0] == Role::Special {
                specials += 1;
            }
            assert_eq!(
                last_roster(&received).unwrap(),
                vec!["A".to_string(), "B".to_string(), "C".to_string()]
            );
        }
        assert_eq!(specials, 1);
        assert!(room.is_started().await);
    }

    #[tokio::test]
    async fn test_start_below_quorum_sends_no_roles() {
        let (transport, registry) = transport();
        let room = registry.create("Viernes", 5).unwrap();

        let mut a = joined(&transport, room.code(), "A").await;
        let mut b = joined(&transport, room.code(), "B").await;
        a.send(ClientMessage::Start).await.unwrap();

        assert!(roles(&drain(&mut a).await).is_empty());
        assert!(roles(&drain(&mut b).await).is_empty());
        assert!(!room.is_started().await);
    }

    #[tokio::test]
    async fn test_repeated_start_sends_roles_once() {
        let (transport, registry) = transport();
        let room = registry.create("Viernes", 3).unwrap();

        let mut a = joined(&transport, room.code(), "A").await;
        let mut b = joined(&transport, room.code(), "B").await;
        a.send(ClientMessage::Start).await.unwrap();
        b.send(ClientMessage::Start).await.unwrap();
        a.send(ClientMessage::Start).await.unwrap();

        assert_eq!(roles(&drain(&mut a).await).len(), 1);
        assert_eq!(roles(&drain(&mut b).await).len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_message_is_rejected_but_connection_survives() {
        let (transport, registry) = transport();
        let room = registry.create("Viernes", 5).unwrap();
        let mut a = joined(&transport, room.code(), "A").await;
        drain(&mut a).await;

        a.send_text(r#"{"type":"dance"}"#).await.unwrap();
        let received = drain(&mut a).await;
        assert!(matches!(received.as_slice(), [ServerMessage::Error(_)]));

        a.send(ClientMessage::Ready).await.unwrap();
        let received = drain(&mut a).await;
        assert_eq!(last_roster(&received).unwrap(), vec!["A".to_string()]);
        assert_eq!(room.snapshot().await.ready, vec!["A"]);
    }

    #[tokio::test]
    async fn test_disconnect_removes_participant() {
        let (transport, registry) = transport();
        let room = registry.create("Viernes", 5).unwrap();
        let mut a = joined(&transport, room.code(), "A").await;
        let b = joined(&transport, room.code(), "B").await;
        drain(&mut a).await;

        assert_eq!(b.disconnect().await, Some(SessionEnd::Disconnected));

        let received = drain(&mut a).await;
        assert_eq!(last_roster(&received).unwrap(), vec!["A".to_string()]);
        assert_eq!(room.member_count(), 1);
    }

    #[tokio::test]
    async fn test_full_room_rejects_join() {
        let (transport, registry) = transport();
        let room = registry.create("Viernes", 2).unwrap();
        let _a = joined(&transport, room.code(), "A").await;
        let _b = joined(&transport, room.code(), "B").await;

        let mut c = transport.connect(room.code(), "C", 8);
        assert!(matches!(c.recv().await, Some(ServerMessage::Error(_))));
        assert_eq!(c.recv().await, None);
        assert_eq!(
            c.session.await.unwrap(),
            SessionEnd::Rejected(RoomError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(room.roster().await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_idle_connection_is_dropped() {
        let registry = Arc::new(RoomRegistry::seeded(3));
        let coordinator =
            Coordinator::new(registry.clone()).with_idle_timeout(Some(Duration::from_millis(50)));
        let transport = MpscTransport::new(coordinator);
        let room = registry.create("Viernes", 5).unwrap();

        let connection = joined(&transport, room.code(), "A").await;
        let end = timeout(Duration::from_secs(2), connection.session)
            .await
            .expect("session should end")
            .unwrap();

        assert_eq!(end, SessionEnd::IdleTimeout);
        assert_eq!(room.member_count(), 0);
    }

    #[tokio::test]
    async fn test_simultaneous_connections_all_join() {
        let (transport, registry) = transport();
        let room = registry.create("Viernes", 20).unwrap();

        let connections: Vec<MpscConnection> = (0..20)
            .map(|i| transport.connect(room.code(), &format!("p{}", i), 64))
            .collect();

        let mut connections = connections;
        for connection in connections.iter_mut() {
            assert!(matches!(
                timeout(Duration::from_secs(1), connection.recv()).await,
                Ok(Some(ServerMessage::Joined { .. }))
            ));
        }

        let roster = room.roster().await;
        assert_eq!(roster.len(), 20);
        let unique: HashSet<&String> = roster.iter().collect();
        assert_eq!(unique.len(), 20);
    }
}
