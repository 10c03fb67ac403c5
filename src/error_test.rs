use super::*;
use std::time::Duration;

fn app(status: u16) -> ClientError {
    ClientError::Transport(TransportError::Application { status, message: "x".into() })
}

#[test]
fn classifies_statuses() {
    assert_eq!(app(503).class(), ErrorClass::Unavailable);
    assert_eq!(app(403).class(), ErrorClass::Credential);
    assert_eq!(app(401).class(), ErrorClass::Credential);
    assert_eq!(app(500).class(), ErrorClass::Application);
    assert_eq!(app(400).class(), ErrorClass::Application);
}

#[test]
fn classifies_network_and_timeout() {
    let network: ClientError = TransportError::Network("offline".into()).into();
    let timeout: ClientError = TransportError::Timeout(Duration::from_secs(1)).into();
    assert_eq!(network.class(), ErrorClass::Network);
    assert_eq!(timeout.class(), ErrorClass::Network);
}

#[test]
fn validation_is_its_own_class() {
    let err: ClientError = ValidationError::MissingDescription.into();
    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(err.status(), None);
    assert_eq!(err.to_string(), "No description available to generate test scenarios.");
}

#[test]
fn only_network_and_unavailable_are_transient() {
    assert!(ErrorClass::Network.is_transient());
    assert!(ErrorClass::Unavailable.is_transient());
    assert!(!ErrorClass::Credential.is_transient());
    assert!(!ErrorClass::Application.is_transient());
    assert!(!ErrorClass::Validation.is_transient());
}

#[test]
fn transport_message_is_transparent() {
    let err = ClientError::Transport(TransportError::Application { status: 400, message: "Prompt is required.".into() });
    assert_eq!(err.to_string(), "Prompt is required.");
}

#[test]
fn in_flight_refusal_is_validation() {
    let err: ClientError = ValidationError::RequestInFlight.into();
    assert_eq!(err.class(), ErrorClass::Validation);
    assert!(!err.class().is_transient());
}
