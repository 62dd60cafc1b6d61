mod tests {
    use ambient_led_controller::math8::{
        level_to_percent, round_to_u8, scale8_rounded, scale8_truncated,
    };

    #[test]
    fn test_scale8_rounded() {
        assert_eq!(scale8_rounded(255, 255), 255);
        assert_eq!(scale8_rounded(0, 200), 0);
        assert_eq!(scale8_rounded(255, 128), 128);
        assert_eq!(scale8_rounded(128, 128), 64);
        assert_eq!(scale8_rounded(200, 0), 0);
    }

    #[test]
    fn test_scale8_truncated() {
        assert_eq!(scale8_truncated(255, 255), 255);
        assert_eq!(scale8_truncated(1, 128), 0);
        assert_eq!(scale8_truncated(90, 128), 45);
        assert_eq!(scale8_truncated(254, 254), 253);
    }

    #[test]
    fn test_level_to_percent() {
        assert_eq!(level_to_percent(0), 0);
        assert_eq!(level_to_percent(1), 0);
        assert_eq!(level_to_percent(2), 1);
        assert_eq!(level_to_percent(128), 50);
        assert_eq!(level_to_percent(254), 100);
        assert_eq!(level_to_percent(255), 100);
    }

    #[test]
    fn test_round_to_u8() {
        assert_eq!(round_to_u8(25.5), 26);
        assert_eq!(round_to_u8(-3.0), 0);
        assert_eq!(round_to_u8(300.0), 255);
        assert_eq!(round_to_u8(f32::NAN), 0);
    }
}
