use super::*;

#[test]
fn layer_id_unassigned_marker() {
    assert_eq!(LayerId::default(), LayerId::UNASSIGNED);
    assert!(!LayerId::UNASSIGNED.is_assigned());
    assert!(LayerId(0).is_assigned());
    assert_eq!(LayerId(7).to_string(), "7");
}

#[test]
fn canvas_from_signed_rejects_negative() {
    assert_eq!(Canvas::from_signed(4, 3).unwrap(), Canvas::new(4, 3));
    assert!(matches!(
        Canvas::from_signed(-1, 3),
        Err(StrataError::InvalidGeometry(_))
    ));
    assert!(Canvas::new(0, 10).is_empty());
    assert_eq!(Canvas::new(3, 5).pixel_count(), 15);
}

#[test]
fn sample_conversions_clamp_and_round() {
    assert_eq!(unit_to_u8(0.0), 0);
    assert_eq!(unit_to_u8(1.0), 255);
    assert_eq!(unit_to_u8(1.7), 255);
    assert_eq!(unit_to_u8(-0.2), 0);
    assert_eq!(unit_to_u8(f32::NAN), 0);
    assert!((u8_to_unit(255) - 1.0).abs() < 1e-6);
    assert_eq!(clamp_unit(0.25), 0.25);
}
