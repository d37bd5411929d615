mod common;

use common::*;
use scard::backend::Pci;
use scard::ffi::constants::*;
use scard::{ctl_code, CardState, Disposition, Error, ErrorKind, Initialization, Protocol, ShareMode};

const SELECT_PIV: &[u8] = &[0x00, 0xa4, 0x04, 0x00, 0x05, 0xa0, 0x00, 0x00, 0x03, 0x08];

#[test]
fn transmit_uses_the_pci_of_the_active_protocol() {
    let backend = MockBackend::with_state(|state| state.card_response = vec![0x61, 0x10]);
    let context = context(&backend);
    let t0 = context.connect(READER, ShareMode::Shared, &[Protocol::T0]).unwrap();
    let t1 = context.connect(READER, ShareMode::Shared, &[Protocol::T1]).unwrap();

    assert_eq!(t0.transmit(SELECT_PIV).unwrap(), [0x61, 0x10]);
    assert_eq!(t1.transmit(SELECT_PIV).unwrap(), [0x61, 0x10]);

    assert_eq!(
        backend.state().transmitted,
        [(Pci::T0, SELECT_PIV.to_vec()), (Pci::T1, SELECT_PIV.to_vec())]
    );
}

#[test]
fn raw_protocol_uses_the_raw_pci() {
    let backend = MockBackend::with_state(|state| state.card_protocol = SCARD_PROTOCOL_RAW);
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::Raw]).unwrap();

    assert_eq!(card.protocol(), Some(Protocol::Raw));
    card.transmit(&[0xff, 0xca, 0x00, 0x00, 0x00]).unwrap();

    assert_eq!(backend.state().transmitted[0].0, Pci::Raw);
}

#[test]
fn transmit_without_a_protocol_is_not_implemented() {
    let backend = MockBackend::new();
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Direct, &[]).unwrap();

    assert!(matches!(card.transmit(SELECT_PIV), Err(Error::NotImplemented(_))));
    assert!(backend.state().transmitted.is_empty());
}

#[test]
fn response_has_the_exact_length() {
    let response = (0..=255).chain([0x90, 0x00]).collect::<Vec<u8>>();
    let backend = MockBackend::with_state(|state| state.card_response = response.clone());
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();

    assert_eq!(card.transmit(SELECT_PIV).unwrap(), response);
}

#[test]
fn oversized_response_is_an_error_not_a_truncation() {
    let backend = MockBackend::with_state(|state| state.card_response = vec![0x5a; 300]);
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();

    let error = card.transmit(SELECT_PIV).unwrap_err();

    assert_eq!(error.kind(), Some(ErrorKind::InsufficientBuffer));
}

#[test]
fn transmit_errors_are_propagated() {
    let backend = MockBackend::new();
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();
    backend.fail_next("transmit", ErrorKind::RemovedCard);

    let error = card.transmit(SELECT_PIV).unwrap_err();

    assert_eq!(error.kind(), Some(ErrorKind::RemovedCard));
}

#[test]
fn reconnect_updates_the_protocol() {
    let backend = MockBackend::new();
    let context = context(&backend);
    let mut card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();
    assert_eq!(card.protocol(), Some(Protocol::T1));

    let protocol = card
        .reconnect(ShareMode::Exclusive, &[Protocol::T0], Initialization::Reset)
        .unwrap();

    assert_eq!(protocol, Some(Protocol::T0));
    assert_eq!(card.protocol(), Some(Protocol::T0));
    assert!(backend.calls().contains(&format!(
        "reconnect({}, {}, {})",
        SCARD_SHARE_EXCLUSIVE, SCARD_PROTOCOL_T0, SCARD_RESET_CARD
    )));
}

#[test]
fn failed_reconnect_keeps_the_protocol() {
    let backend = MockBackend::new();
    let context = context(&backend);
    let mut card = context.connect(READER, ShareMode::Shared, &[Protocol::T0]).unwrap();
    backend.fail_next("reconnect", ErrorKind::SharingViolation);

    let error = card
        .reconnect(ShareMode::Exclusive, &[Protocol::T1], Initialization::Leave)
        .unwrap_err();

    assert_eq!(error.kind(), Some(ErrorKind::SharingViolation));
    assert_eq!(card.protocol(), Some(Protocol::T0));
}

#[test]
fn disconnect_clears_the_protocol() {
    let backend = MockBackend::new();
    let context = context(&backend);
    let mut card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();

    card.disconnect(Disposition::Unpower).unwrap();

    assert_eq!(card.protocol(), None);
    assert_eq!(card.handle(), None);
    assert!(backend.state().cards.is_empty());
    assert_eq!(backend.state().dispositions, [SCARD_UNPOWER_CARD]);

    card.disconnect(Disposition::Reset).unwrap();
    assert_eq!(backend.state().dispositions, [SCARD_UNPOWER_CARD]);

    assert!(matches!(card.transmit(SELECT_PIV), Err(Error::Precondition(_))));
    assert!(matches!(card.status(), Err(Error::Precondition(_))));
    assert!(matches!(card.begin_transaction(), Err(Error::Precondition(_))));
}

#[test]
fn drop_leaves_the_card() {
    let backend = MockBackend::new();
    let context = context(&backend);

    drop(context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap());

    assert!(backend.state().cards.is_empty());
    assert_eq!(backend.state().dispositions, [SCARD_LEAVE_CARD]);
}

#[test]
fn transactions() {
    let backend = MockBackend::new();
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();

    card.begin_transaction().unwrap();
    assert!(backend.state().cards.values().all(|card| card.in_transaction));
    card.transmit(SELECT_PIV).unwrap();
    card.end_transaction(Disposition::Leave).unwrap();

    let error = card.end_transaction(Disposition::Leave).unwrap_err();
    assert_eq!(error.kind(), Some(ErrorKind::NotTransacted));
}

#[test]
fn status_two_phase() {
    let backend = MockBackend::new();
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();

    let status = card.status().unwrap();

    assert_eq!(status.reader_names, [READER]);
    assert_eq!(status.reader_name(), Some(READER));
    assert_eq!(status.protocol, Some(Protocol::T1));
    assert_eq!(status.atr, ATR);
    if cfg!(target_os = "windows") {
        assert_eq!(status.state, CardState::SPECIFIC);
    } else {
        assert_eq!(status.state, CardState::PRESENT | CardState::POWERED | CardState::NEGOTIABLE);
        assert!(status.present());
        assert!(status.negotiable());
        assert!(!status.absent());
    }

    let calls = backend.calls();
    assert_eq!(calls[calls.len() - 2..], ["status(null)".to_owned(), "status(buffer)".to_owned()]);
}

#[test]
fn status_tolerates_insufficient_buffer_on_sizing() {
    let backend = MockBackend::with_state(|state| state.status_sizing_insufficient_buffer = true);
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::T0]).unwrap();

    let status = card.status().unwrap();

    assert_eq!(status.reader_name(), Some(READER));
    assert_eq!(status.protocol, Some(Protocol::T0));
    assert_eq!(status.atr, ATR);
}

#[test]
fn status_errors_are_propagated() {
    let backend = MockBackend::new();
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();
    backend.fail_next("status(buffer)", ErrorKind::RemovedCard);

    assert_eq!(card.status().unwrap_err().kind(), Some(ErrorKind::RemovedCard));
}

#[test]
fn control_without_a_receive_buffer() {
    let backend = MockBackend::new();
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Direct, &[]).unwrap();
    let code = ctl_code(3400);

    assert_eq!(card.control(code, Some(&[0x01u8][..]), 0).unwrap(), None);

    let controlled = backend.state().controlled.clone();
    assert_eq!(controlled.len(), 1);
    assert_eq!(controlled[0].0 as u64, code);
    assert_eq!(controlled[0].1.as_deref(), Some(&[0x01][..]));
}

#[test]
fn control_returns_what_the_reader_sent() {
    let backend = MockBackend::with_state(|state| state.control_response = vec![0x06, 0x04, 0x42, 0x33, 0x00, 0x12]);
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Direct, &[]).unwrap();

    let features = card.control(ctl_code(3400), None, 256).unwrap();
    assert_eq!(features.as_deref(), Some(&[0x06, 0x04, 0x42, 0x33, 0x00, 0x12][..]));

    let truncated = card.control(ctl_code(3400), None, 2).unwrap();
    assert_eq!(truncated.as_deref(), Some(&[0x06, 0x04][..]));

    assert_eq!(backend.state().controlled[0].1, None);
}

#[test]
fn control_code_must_fit_a_dword() {
    let backend = MockBackend::new();
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Direct, &[]).unwrap();

    if scard::platform::DWORD_SIZE == 4 {
        assert!(matches!(
            card.control(1 << 40, None, 0),
            Err(Error::Precondition(_))
        ));
    }
}

#[test]
fn unsupported_attribute_is_no_value() {
    for unsupported in [ErrorKind::Unexpected, ErrorKind::UnsupportedFeature] {
        let backend = MockBackend::with_state(|state| state.unsupported_attribute_status = unsupported);
        let context = context(&backend);
        let card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();

        assert_eq!(card.get_attrib(scard::Attribute::VendorName).unwrap(), None);
    }
}

#[test]
fn empty_attribute_is_not_unsupported() {
    let backend = MockBackend::with_state(|state| {
        state.attributes.insert(0x0001_0100, Vec::new());
    });
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();

    assert_eq!(card.get_attrib(scard::Attribute::VendorName).unwrap(), Some(Vec::new()));
}

#[test]
fn attribute_errors_are_propagated() {
    let backend = MockBackend::with_state(|state| state.unsupported_attribute_status = ErrorKind::RemovedCard);
    let context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();

    let error = card.get_attrib(scard::Attribute::VendorName).unwrap_err();

    assert_eq!(error.kind(), Some(ErrorKind::RemovedCard));
}

#[test]
fn cards_outlive_nothing_but_their_handles() {
    let backend = MockBackend::new();
    let mut context = context(&backend);
    let card = context.connect(READER, ShareMode::Shared, &[Protocol::Any]).unwrap();

    context.release().unwrap();

    // The card handle is independent of the context object.
    assert_eq!(card.transmit(SELECT_PIV).unwrap(), SW_SUCCESS);
}
