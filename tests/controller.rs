mod common;

mod tests {
    use core::pin::pin;
    use core::task::{Context, Poll, Waker};

    use ambient_led_controller::aqi::AUTO_COLORS;
    use ambient_led_controller::color::scale_color;
    use ambient_led_controller::sensor::LayoutError;
    use ambient_led_controller::{
        AqiBand, ControlEvent, ControlEvents, ControllerConfig, Coordinate, DEFAULT_CALIBRATION,
        DisplayMode, Duration, EventSet, InitError, LightController, ManualLevel, PendingRuleSlot, Rgb,
        SharedLed,
    };
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    use crate::common::{CONVERSION, Sim, SimClock, SimLed, SimSensor, sim};

    type Controller<'a> =
        LightController<'a, CriticalSectionRawMutex, SimLed, SimSensor, SimClock, 8>;

    fn ms(millis: u64) -> u64 {
        Duration::from_millis(millis).as_ticks()
    }

    struct Bench {
        sim: Sim,
        led: SharedLed<CriticalSectionRawMutex, SimLed>,
        pending: PendingRuleSlot,
        events: ControlEvents,
        config: ControllerConfig,
    }

    impl Bench {
        fn new() -> Self {
            let sim = sim();
            let config = ControllerConfig::default();
            Self {
                led: SharedLed::new(SimLed(sim.clone())),
                pending: PendingRuleSlot::new(config.transition),
                events: ControlEvents::new(),
                config,
                sim,
            }
        }

        fn try_controller(&self) -> Result<Controller<'_>, InitError> {
            LightController::new(
                &self.led,
                &self.pending,
                &self.events,
                SimSensor(self.sim.clone()),
                SimClock(self.sim.clone()),
                &DEFAULT_CALIBRATION,
                &self.config,
            )
        }

        fn controller(&self) -> Controller<'_> {
            self.try_controller().unwrap()
        }

        fn advance(&self, ticks: u64) {
            self.sim.borrow_mut().now += ticks;
        }
    }

    fn only(event: ControlEvent) -> EventSet {
        EventSet::EMPTY.with(event)
    }

    fn run_cycles(bench: &Bench, controller: &mut Controller<'_>, count: usize) {
        for _ in 0..count {
            bench.advance(ms(20));
            controller.process(only(ControlEvent::ControlCycle));
        }
    }

    #[test]
    fn test_led_not_ready_is_fatal() {
        let bench = Bench::new();
        bench.sim.borrow_mut().led_ready = false;
        assert!(matches!(bench.try_controller(), Err(InitError::LedNotReady)));
    }

    #[test]
    fn test_inconsistent_layout_is_rejected() {
        let bench = Bench::new();
        bench.sim.borrow_mut().channels = 3;
        assert!(matches!(
            bench.try_controller(),
            Err(InitError::InvalidChannelLayout(LayoutError::ChannelOutOfRange))
        ));
    }

    #[test]
    fn test_unavailable_sensor_is_not_fatal() {
        let bench = Bench::new();
        bench.sim.borrow_mut().sensor_ready = false;
        let mut controller = bench.controller();
        controller.process(only(ControlEvent::MeasureLuminosity));
        assert_eq!(controller.ring().valid_count(), 0);
        assert!(controller.luminosity().is_nan());
    }

    #[test]
    fn test_boot_fade_shows_first() {
        let bench = Bench::new();
        let mut controller = bench.controller();
        controller.process(only(ControlEvent::ControlCycle));
        let expected = DEFAULT_CALIBRATION.brightness_to_currents_and_pwms(Rgb::new(0, 0, 10), 100);
        assert_eq!(bench.led.last_output(), expected);
        assert!(controller.engine().active().unwrap().auto_repeat());
    }

    #[test]
    fn test_first_aqi_reading_retires_boot_fade() {
        let bench = Bench::new();
        let mut controller = bench.controller();
        run_cycles(&bench, &mut controller, 10);
        assert!(!bench.pending.is_pending());

        controller.set_aqi(95.0);
        let events = bench.events.take();
        assert!(events.contains(ControlEvent::StopBootFade));
        assert!(bench.pending.is_pending());
        controller.process(events);
        assert!(!controller.engine().active().unwrap().auto_repeat());

        run_cycles(&bench, &mut controller, 200);
        let (brightness, dim) = controller.feedback().auto_levels();
        let color = scale_color(AUTO_COLORS[AqiBand::Excellent.index()], dim);
        assert_eq!(
            bench.led.last_output(),
            DEFAULT_CALIBRATION.brightness_to_currents_and_pwms(color, brightness)
        );
        assert_eq!(bench.pending.active_target(), Some(Coordinate::color(brightness, color)));
        assert_eq!(controller.engine().retired_count(), 2);
    }

    #[test]
    fn test_boot_fade_times_out_without_aqi() {
        let bench = Bench::new();
        let mut controller = bench.controller();
        controller.set_aqi(f32::NAN);
        assert!(!bench.events.take().contains(ControlEvent::StopBootFade));

        bench.advance(ms(31_000));
        controller.process(only(ControlEvent::ControlCycle));
        assert!(bench.events.take().contains(ControlEvent::StopBootFade));
        assert!(bench.pending.is_pending());
        assert!(!controller.feedback().is_boot_fade_active());
    }

    #[test]
    fn test_blanked_measurements_feed_the_ring() {
        let bench = Bench::new();
        let mut controller = bench.controller();
        controller.process(only(ControlEvent::ControlCycle));
        assert!(!bench.led.last_output().is_off());

        for _ in 0..4 {
            controller.process(only(ControlEvent::MeasureLuminosity));
            bench.advance(ms(200));
        }
        assert_eq!(controller.ring().valid_count(), 4);
        assert_eq!(controller.luminosity(), 120.0);
        assert!(controller.feedback().smoothed_luminosity() < 200.0);
        // LED output is back where the engine left it
        assert_eq!(bench.sim.borrow().current_output(), bench.led.last_output());
    }

    #[test]
    fn test_manual_mode_reads_directly() {
        let bench = Bench::new();
        let mut controller = bench.controller();
        controller.set_mode(DisplayMode::Manual(ManualLevel::Day));
        let blanks = bench.sim.borrow().blank_writes().len();

        controller.process(only(ControlEvent::MeasureLuminosity));
        assert_eq!(controller.luminosity(), 120.0);
        assert_eq!(controller.ring().valid_count(), 0);
        assert_eq!(bench.sim.borrow().blank_writes().len(), blanks);
    }

    #[test]
    fn test_direct_readings_stay_out_of_moving_average() {
        let bench = Bench::new();
        let mut controller = bench.controller();
        controller.process(only(ControlEvent::ControlCycle));
        assert!(!bench.led.last_output().is_off());
        bench.advance(8 * CONVERSION);

        let smoothed = controller.feedback().smoothed_luminosity();
        let levels = controller.feedback().auto_levels();
        controller.set_mode(DisplayMode::ManualPercentage(500));
        controller.process(only(ControlEvent::MeasureLuminosity));

        // the direct reading sees the LED
        assert_eq!(controller.luminosity(), 620.0);
        assert_eq!(controller.feedback().smoothed_luminosity(), smoothed);
        assert_eq!(controller.feedback().auto_levels(), levels);

        controller.set_mode(DisplayMode::Auto);
        for _ in 0..4 {
            controller.process(only(ControlEvent::MeasureLuminosity));
            bench.advance(ms(200));
        }
        assert_eq!(controller.luminosity(), 120.0);
        assert!(controller.feedback().smoothed_luminosity() < smoothed);
    }

    #[test]
    fn test_health_check_reaches_driver() {
        let bench = Bench::new();
        let mut controller = bench.controller();
        bench.sim.borrow_mut().led_healthy = false;
        controller.process(only(ControlEvent::HealthCheck));
        controller.process(only(ControlEvent::HealthCheck));
        assert_eq!(bench.sim.borrow().health_checks, 2);
    }

    #[test]
    fn test_run_once_follows_timers() {
        let bench = Bench::new();
        let mut controller = bench.controller();
        let writes = bench.sim.borrow().led_writes.len();

        let deadline = controller.run_once();
        assert_eq!(bench.sim.borrow().health_checks, 1);
        assert!(bench.sim.borrow().led_writes.len() > writes);
        assert!(deadline.as_ticks() > bench.sim.borrow().now);

        controller.run_once();
        assert_eq!(bench.sim.borrow().health_checks, 1);
    }

    #[test]
    fn test_turn_off_before_reboot_rendezvous() {
        let bench = Bench::new();
        let mut controller = bench.controller();
        controller.process(only(ControlEvent::ControlCycle));

        let mut request = pin!(bench.events.turn_off_before_reboot());
        let mut cx = Context::from_waker(Waker::noop());
        assert!(request.as_mut().poll(&mut cx).is_pending());

        let events = bench.events.take().with(ControlEvent::ControlCycle);
        assert!(events.contains(ControlEvent::TurnOffBeforeReboot));
        let writes = bench.sim.borrow().led_writes.len();
        controller.process(events);

        assert_eq!(request.as_mut().poll(&mut cx), Poll::Ready(()));
        assert!(controller.is_turned_off());
        let state = bench.sim.borrow();
        assert!(state.led_deinit);
        assert!(state.current_output().is_off());
        // only the blanking write, the control cycle was dropped
        assert_eq!(state.led_writes.len(), writes + 1);
        drop(state);

        controller.process(only(ControlEvent::ControlCycle));
        assert_eq!(bench.sim.borrow().led_writes.len(), writes + 1);
    }
}
