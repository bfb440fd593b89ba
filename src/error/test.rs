#[cfg(test)]
mod tests {
    use crate::error::{ApiError, ConnectionError, RegistryError, RoomError};
    use axum::http::StatusCode;

    #[test]
    fn test_only_invalid_message_is_recoverable() {
        assert!(ConnectionError::InvalidMessage("bad".into()).is_recoverable());
        assert!(!ConnectionError::Closed.is_recoverable());
        assert!(!ConnectionError::Transport("reset".into()).is_recoverable());
    }

    #[test]
    fn test_serde_error_maps_to_invalid_message() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ConnectionError = err.into();
        assert!(matches!(err, ConnectionError::InvalidMessage(_)));
    }

    #[test]
    fn test_room_errors_map_to_http_status() {
        let not_found: ApiError = RoomError::RoomNotFound.into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let full: ApiError = RoomError::CapacityExceeded { capacity: 5 }.into();
        assert_eq!(full.status, StatusCode::BAD_REQUEST);
        assert_eq!(full.message, "room is full (5 players)");
    }

    #[test]
    fn test_invalid_capacity_message() {
        let err = RegistryError::InvalidCapacity {
            requested: 1,
            min: 2,
            max: 100,
        };
        assert_eq!(err.to_string(), "capacity must be between 2 and 100, got 1");
        let api: ApiError = err.into();
        assert_eq!(api.code, "BAD_REQUEST");
    }
}
