#![no_std]
#![no_main]
mod time_display;

use panic_rtt_target as _;

use chrono::Timelike;
use core::convert::Infallible;
use cortex_m::peripheral::DWT;
use dcf77_edge_decoder::{CalendarTime, Dcf77Receiver, MonotonicClock, Phase};
use embedded_hal::digital::{ErrorType, InputPin};
use ht16k33::{Dimming, Display, HT16K33};
use rtcc::Rtcc;
use rtic::app;
use rtic::cyccnt::U32Ext;
use rtic::Mutex;
use rtt_target::{rprintln, rtt_init_print};
use stm32f4xx_hal::{
    gpio::{gpioa, gpiob, gpioc, AlternateOD, Edge, ExtiPin, Input, Output, PullUp, PushPull},
    i2c::I2c,
    pac,
    prelude::*,
    rtc::Rtc,
};
use time_display::{SegmentDisplayAdapter, StatusDots};

const DISP_I2C_ADDR: u8 = 0x70;
const SYSCLK_HZ: u32 = 168_000_000;
const CYCLES_PER_US: u32 = SYSCLK_HZ / 1_000_000;
/// Display refresh and decode interval, one second.
const POLL_PERIOD: u32 = SYSCLK_HZ;

pub type SegmentDisplay =
    HT16K33<I2c<pac::I2C1, (gpiob::PB6<AlternateOD<4>>, gpiob::PB7<AlternateOD<4>>)>>;

/// DCF77 receiver output on PA6.
pub struct DcfPin(gpioa::PA6<Input<PullUp>>);

impl ErrorType for DcfPin {
    type Error = Infallible;
}

impl InputPin for DcfPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.is_low())
    }
}

/// DWT cycle counter widened to 64 bits. Must be read at least once per
/// counter wrap (about 25 s at 168 MHz), the poll task takes care of that.
pub struct CycleClock {
    last: u32,
    cycles: u64,
}

impl CycleClock {
    fn new() -> Self {
        Self {
            last: DWT::cycle_count(),
            cycles: 0,
        }
    }
}

impl MonotonicClock for CycleClock {
    fn now_us(&mut self) -> u64 {
        let now = DWT::cycle_count();
        self.cycles += now.wrapping_sub(self.last) as u64;
        self.last = now;
        self.cycles / CYCLES_PER_US as u64
    }
}

/// Sets the RTC to the start of the minute named by `time`.
fn sync_rtc(rtc: &mut Rtc, time: &CalendarTime) -> bool {
    let dt = match time.to_naive_datetime() {
        Some(dt) => dt,
        None => {
            rprintln!("Not a calendar date: {:?}", time);
            return false;
        }
    };
    match rtc.set_datetime(&dt) {
        Ok(()) => {
            rprintln!("Good date: {:?}", dt);
            true
        }
        Err(_) => {
            rprintln!("Could not set RTC");
            false
        }
    }
}

#[app(device = stm32f4xx_hal::pac, monotonic = rtic::cyccnt::CYCCNT, peripherals = true)]
const APP: () = {
    struct Resources {
        receiver: Dcf77Receiver<DcfPin, CycleClock>,
        debug_pin: gpioc::PC6<Output<PushPull>>,
        rtc: Rtc,
        segment_display: SegmentDisplayAdapter,
        #[init(false)]
        synchronized: bool,
        #[init(false)]
        colon: bool,
    }

    #[init(schedule = [poll])]
    fn init(cx: init::Context) -> init::LateResources {
        rtt_init_print!();
        let mut core = cx.core;
        let device = cx.device;

        core.DCB.enable_trace();
        DWT::unlock();
        core.DWT.enable_cycle_counter();

        let rcc = device.RCC.constrain();
        let clocks = rcc
            .cfgr
            .use_hse(12.mhz())
            .sysclk(SYSCLK_HZ.hz())
            .freeze();
        let mut syscfg = device.SYSCFG.constrain();
        let mut exti = device.EXTI;
        let mut pwr = device.PWR;

        let gpiob = device.GPIOB.split();
        let scl = gpiob.pb6.into_alternate_open_drain::<4>();
        let sda = gpiob.pb7.into_alternate_open_drain::<4>();
        let i2c = I2c::new(device.I2C1, (scl, sda), 400.khz(), clocks);
        let mut ht16k33 = HT16K33::new(i2c, DISP_I2C_ADDR);
        ht16k33.initialize().expect("Failed to initialize ht16k33");
        ht16k33
            .set_display(Display::ON)
            .expect("Could not turn on the display!");
        ht16k33
            .set_dimming(Dimming::BRIGHTNESS_MAX)
            .expect("Could not set dimming!");
        let mut segment_display = SegmentDisplayAdapter::new(ht16k33);
        segment_display
            .display_unsynchronized(StatusDots::default())
            .expect("Could not write 7-segment display");

        // The receiver output is the interrupt source, both edges
        let gpioa = device.GPIOA.split();
        let mut pin = gpioa.pa6.into_pull_up_input();
        pin.make_interrupt_source(&mut syscfg);
        pin.trigger_on_edge(&mut exti, Edge::RisingFalling);
        pin.enable_interrupt(&mut exti);

        // Use this pin for debugging decoded signal state with oscilloscope
        let gpioc = device.GPIOC.split();
        let debug_pin = gpioc.pc6.into_push_pull_output();

        let rtc = Rtc::new(device.RTC, 255, 127, false, &mut pwr);

        cx.schedule
            .poll(cx.start + POLL_PERIOD.cycles())
            .expect("Could not schedule poll");
        rprintln!("Init successful");
        init::LateResources {
            receiver: Dcf77Receiver::new(DcfPin(pin), CycleClock::new()),
            debug_pin,
            rtc,
            segment_display,
        }
    }

    #[allow(clippy::empty_loop)]
    #[idle()]
    fn idle(_cx: idle::Context) -> ! {
        rprintln!("idle");
        loop {}
    }

    #[task(binds = EXTI9_5, priority = 2, resources = [receiver, debug_pin, rtc, synchronized])]
    fn exti9_5(cx: exti9_5::Context) {
        let receiver = cx.resources.receiver;
        let dcf_pin = &mut receiver.pin_mut().0;
        let dcf_interrupted = dcf_pin.check_interrupt();
        dcf_pin.clear_interrupt_pending_bit();
        if !dcf_interrupted {
            return;
        }
        let before = receiver.decoder().phase();
        if receiver.on_edge_interrupt().is_err() {
            return;
        }
        let phase = receiver.decoder().phase();

        // The frame completed last minute names the minute starting at this edge
        if before == Phase::Armed && phase == Phase::Receiving {
            if let Ok(time) = receiver.decoder().decode() {
                if sync_rtc(cx.resources.rtc, &time) {
                    *cx.resources.synchronized = true;
                }
            }
        }

        let debug_pin = cx.resources.debug_pin;
        if phase == Phase::Receiving {
            debug_pin.set_high();
        } else {
            debug_pin.set_low();
        }
    }

    #[task(priority = 1, schedule = [poll], resources = [receiver, rtc, segment_display, synchronized, colon])]
    fn poll(mut cx: poll::Context) {
        let (decoded, phase) = cx
            .resources
            .receiver
            .lock(|receiver| (receiver.decode(), receiver.decoder().phase()));
        let now = cx.resources.rtc.lock(|rtc| rtc.get_datetime());
        let synchronized = cx.resources.synchronized.lock(|synchronized| *synchronized);

        let status = StatusDots {
            receiving: phase == Phase::Receiving,
            decoded: decoded.is_ok(),
        };
        let colon = cx.resources.colon;
        *colon = !*colon;
        let display = cx.resources.segment_display;
        let shown = match now {
            Ok(now) if synchronized => display
                .display_time(now.hour() as u8, now.minute() as u8, status)
                .and_then(|_| display.blink_second(*colon)),
            _ => display.display_unsynchronized(status),
        };
        if let Err(e) = shown {
            rprintln!("Could not write 7-segment display: {:?}", e);
        }

        if cx.schedule.poll(cx.scheduled + POLL_PERIOD.cycles()).is_err() {
            rprintln!("Could not reschedule poll");
        }
    }

    extern "C" {
        fn UART4();
    }
};
