use super::*;

#[test]
fn generation_kinds() {
    assert!(RequestKind::Generate.is_generation());
    assert!(RequestKind::Regenerate.is_generation());
    assert!(RequestKind::ManualPrompt.is_generation());
    assert!(!RequestKind::Select.is_generation());
    assert!(!RequestKind::Preview.is_generation());
    assert!(!RequestKind::Chat.is_generation());
}

#[test]
fn pending_request_records_kind() {
    let pending = PendingRequest::start(RequestKind::Refresh);
    assert_eq!(pending.kind, RequestKind::Refresh);
    assert!(pending.elapsed() < Duration::from_secs(60));
}

#[test]
fn tone_default_is_info() {
    assert_eq!(Tone::default(), Tone::Info);
    assert_eq!(Notice::new(Tone::Danger, "x").text, "x");
}
