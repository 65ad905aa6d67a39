//! Property-based tests for identity generation and the client frame codec.

use bytes::BytesMut;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wsswarm::protocol::{Frame, HandshakeResponse, OpCode, apply_mask};
use wsswarm::{AuthMessage, Stage, choose_stage, generate_identity};

proptest! {
    #[test]
    fn test_identity_is_alphanumeric(seed in any::<u64>(), len in 1usize..64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let id = generate_identity(&mut rng, len);
        prop_assert_eq!(id.len(), len);
        prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_stage_always_valid(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let stage = choose_stage(&mut rng);
        prop_assert!(Stage::ALL.contains(&stage));
        prop_assert!((1..=3).contains(&stage.number()));
    }

    #[test]
    fn test_auth_message_carries_identity(seed in any::<u64>()) {
        let id = generate_identity(&mut StdRng::seed_from_u64(seed), 8);
        let json = AuthMessage::for_identity(&id).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&value["ID"], &value["Payload"]["Username"]);
        prop_assert_eq!(value["ID"].as_str(), Some(id.as_str()));
        prop_assert_eq!(value["Payload"]["Success"].as_bool(), Some(true));
    }

    #[test]
    fn test_masked_frame_decodes_to_payload(
        text in "[ -~]{0,300}",
        mask in any::<[u8; 4]>()
    ) {
        let frame = Frame::text(text.clone());
        let mut buf = BytesMut::new();
        frame.encode(&mut buf, Some(mask));
        prop_assert_eq!(buf.len(), frame.wire_size(true));

        let (parsed, consumed) = Frame::parse(&buf).unwrap();
        prop_assert_eq!(consumed, buf.len());
        prop_assert_eq!(parsed.opcode, OpCode::Text);
        prop_assert!(parsed.fin);
        prop_assert_eq!(parsed.payload(), text.as_bytes());
    }

    #[test]
    fn test_split_frame_reports_incomplete(
        payload in prop::collection::vec(any::<u8>(), 1..400),
        cut_ratio in 0.0f64..1.0
    ) {
        let frame = Frame::new(true, OpCode::Binary, payload);
        let mut buf = BytesMut::new();
        frame.encode(&mut buf, None);
        let cut = ((buf.len() as f64) * cut_ratio) as usize;
        prop_assume!(cut < buf.len());

        let result = Frame::parse(&buf[..cut]);
        let is_incomplete = matches!(result, Err(wsswarm::Error::IncompleteFrame { .. }));
        prop_assert!(is_incomplete);
    }

    #[test]
    fn test_mask_reversible(
        data in prop::collection::vec(any::<u8>(), 0..1000),
        mask in any::<[u8; 4]>()
    ) {
        let mut masked = data.clone();
        apply_mask(&mut masked, mask);
        apply_mask(&mut masked, mask);
        prop_assert_eq!(masked, data);
    }

    #[test]
    fn test_handshake_parse_no_panic(data in prop::collection::vec(any::<u8>(), 0..2000)) {
        let _ = HandshakeResponse::parse(&data);
    }
}
