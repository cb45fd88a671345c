#![no_std]
#![no_main]

mod peripherals;
mod system;

// Panic handler and debugging
use defmt::unwrap;

use defmt_rtt as _;
use panic_probe as _;

// Device
use embassy_executor::Spawner;
use embassy_nrf::{
    bind_interrupts,
    gpio::{Input, Level, Output, OutputDrive, Pull},
    peripherals::SPI2,
    saadc::{self, ChannelConfig, Resolution, Saadc},
    spim,
};
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Channel, signal::Signal};
use embassy_time::{Duration, Ticker, Timer};
use embedded_graphics::primitives::Rectangle;
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
    SPIM2_SPIS2_SPI2 => spim::InterruptHandler<SPI2>;
});

// Crate
use contrast_dots::{
    DotWatchface, Event, EventSource, Runtime, Screen, Surface, VibePattern, WatchFace,
    WatchFaceState, WatchfaceConfig,
};
use peripherals::{
    battery::Battery,
    display::{BacklightPins, Display},
    vibrator::Vibrator,
};
use system::{
    bluetooth::{self, Server},
    config::system_config,
    time::WallClock,
};

// Others
use chrono::Timelike;

// Include current UTC epoch at compile time
include!(concat!(env!("OUT_DIR"), "/utc.rs"));
const TIMEZONE: i64 = 1 * 3_600;

// Communication channels
static EVENTS: Channel<ThreadModeRawMutex, Event, 8> = Channel::new();
static VIBRATE: Signal<ThreadModeRawMutex, VibePattern> = Signal::new();
static RESYNC: Signal<ThreadModeRawMutex, Duration> = Signal::new();

static SERVER: StaticCell<Server> = StaticCell::new();

/// Runtime services backed by the PineTime tasks.
///
/// Dirty surfaces are painted by `watchface_task` once each event has been handled.
struct FirmwareRuntime {
    screen: Screen,
}

impl Runtime for FirmwareRuntime {
    fn register_surface(&mut self, surface: Surface, bounds: Rectangle) {
        self.screen.register(surface, bounds);
    }

    fn release_surface(&mut self, surface: Surface) {
        self.screen.release(surface);
    }

    fn subscribe(&mut self, source: EventSource) {
        self.screen.subscribe(source);
    }

    fn unsubscribe(&mut self, source: EventSource) {
        self.screen.unsubscribe(source);
    }

    fn mark_dirty(&mut self, surface: Surface) {
        self.screen.mark_dirty(surface);
    }

    fn vibrate(&mut self, pattern: VibePattern) {
        VIBRATE.signal(pattern);
    }

    fn invert_region(&mut self, region: Rectangle) {
        self.screen.set_inverted(region);
    }

    fn schedule_resync(&mut self, delay: Duration) {
        RESYNC.signal(delay);
    }
}

/// Dispatch events into the watchface one at a time and paint whatever they dirtied.
#[embassy_executor::task(pool_size = 1)]
async fn watchface_task(mut face: DotWatchface, mut display: Display, state: WatchFaceState) {
    let mut runtime = FirmwareRuntime {
        screen: Screen::new(),
    };
    face.init(&mut runtime, state);
    paint(&mut display, &mut runtime, &face);

    loop {
        let event = EVENTS.receive().await;
        if !runtime.screen.accepts(&event) {
            continue;
        }
        face.handle_event(event, &mut runtime);
        paint(&mut display, &mut runtime, &face);
    }
}

fn paint(display: &mut Display, runtime: &mut FirmwareRuntime, face: &DotWatchface) {
    match display.redraw(&mut runtime.screen, face) {
        Ok(0) => {}
        Ok(count) => defmt::debug!("Redrew {} surfaces", count),
        Err(e) => defmt::warn!("Redraw failed: {}", e),
    }
}

/// Emit a tick whenever the minute changes.
#[embassy_executor::task(pool_size = 1)]
async fn clock_task(clock: WallClock) {
    let mut minute = clock.local_time().minute();
    let mut tick = Ticker::every(Duration::from_secs(1));
    loop {
        tick.next().await;

        let now = clock.local_time();
        if now.minute() != minute {
            minute = now.minute();
            EVENTS.send(Event::tick(&now)).await;
        }
    }
}

/// Deliver the wall-clock time once the requested settling delay has passed.
#[embassy_executor::task(pool_size = 1)]
async fn resync_task(clock: WallClock) {
    loop {
        let delay = RESYNC.wait().await;
        Timer::after(delay).await;
        EVENTS.send(Event::resync(&clock.local_time())).await;
    }
}

/// Fetch the battery status from the hardware.
#[embassy_executor::task(pool_size = 1)]
async fn battery_task(mut battery: Battery, server: &'static Server) {
    let mut tick = Ticker::every(Duration::from_secs(10));
    loop {
        tick.next().await;

        match battery.update().await {
            Ok(Some(status)) => {
                defmt::info!(
                    "Battery status: {}% ({})",
                    status.percent,
                    if status.charging {
                        "charging"
                    } else {
                        "discharging"
                    }
                );
                if server.bas.battery_level_set(&status.percent).is_err() {
                    defmt::warn!("Could not update battery characteristic");
                }
                EVENTS.send(Event::BatteryChanged(status.percent)).await;
            }
            Ok(None) => {}
            Err(e) => defmt::warn!("Battery measurement failed: {}", e),
        }
    }
}

/// Play vibration patterns requested by the watchface
#[embassy_executor::task(pool_size = 1)]
async fn vibration_task(mut vibrator: Vibrator) {
    loop {
        let pattern = VIBRATE.wait().await;
        vibrator.play(pattern).await;
    }
}

#[embassy_executor::task(pool_size = 1)]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Advertise, and report every connection and disconnection to the watchface.
#[embassy_executor::task(pool_size = 1)]
async fn bluetooth_task(sd: &'static Softdevice, server: &'static Server) {
    loop {
        let conn = match bluetooth::wait_for_connection(sd).await {
            Ok(conn) => conn,
            Err(e) => {
                defmt::warn!("Advertising failed: {}", e);
                Timer::after(Duration::from_secs(1)).await;
                continue;
            }
        };

        EVENTS.send(Event::ConnectionChanged(true)).await;
        bluetooth::serve(&conn, server).await;
        EVENTS.send(Event::ConnectionChanged(false)).await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut p = embassy_nrf::init(system_config());
    defmt::info!("Initializing");

    // Bluetooth
    let sd = Softdevice::enable(&bluetooth::softdevice_config());
    let server: &'static Server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;

    // Initialize SAADC
    let mut saadc_config = saadc::Config::default();
    // Set resolution to 12bit, necessary for correct battery status calculation
    saadc_config.resolution = Resolution::_12BIT;
    // Pin P0.31: Voltage level
    let channel_config = ChannelConfig::single_ended(&mut p.P0_31);
    let saadc = Saadc::new(p.SAADC, Irqs, saadc_config, [channel_config]);
    saadc.calibrate().await;

    // Initialize battery, P0.12: charge indication
    let mut battery = Battery::init(saadc, Input::new(p.P0_12, Pull::None));
    let percent = match battery.update().await {
        Ok(Some(status)) => status.percent,
        _ => 0,
    };

    // Initialize vibration motor
    let vibrator = Vibrator::init(Output::new(p.P0_16, Level::High, OutputDrive::Standard));

    // Initialize SPI
    let mut spim_config = spim::Config::default();
    // Use SPI at 8MHz (the fastest clock available on the nRF52832),
    // otherwise refreshing will be super slow.
    spim_config.frequency = spim::Frequency::M8;
    // SPI must be used in mode 3. Mode 0 (the default) won't work.
    spim_config.mode = spim::MODE_3;
    let spim = spim::Spim::new(p.SPI2, Irqs, p.P0_02, p.P0_04, p.P0_03, spim_config);

    // Initialize LCD
    let display = unwrap!(Display::init(
        spim,
        Output::new(p.P0_25, Level::High, OutputDrive::Standard),
        Output::new(p.P0_18, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_26, Level::Low, OutputDrive::Standard),
        BacklightPins {
            low: Output::new(p.P0_14, Level::High, OutputDrive::Standard),
            mid: Output::new(p.P0_22, Level::High, OutputDrive::Standard),
            high: Output::new(p.P0_23, Level::High, OutputDrive::Standard),
        },
    ));

    // Lay out the watchface, refusing to start on a display the grids do not fit
    let face = unwrap!(DotWatchface::new(display.size(), &WatchfaceConfig::DEFAULT));

    let clock = WallClock::at_boot(UTC_TIME, TIMEZONE);
    let state = WatchFaceState {
        time: clock.local_time(),
        connected: false,
        percent,
    };

    defmt::info!("Initialization finished");

    // Schedule tasks
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(watchface_task(face, display, state)));
    unwrap!(spawner.spawn(clock_task(clock)));
    unwrap!(spawner.spawn(resync_task(clock)));
    unwrap!(spawner.spawn(battery_task(battery, server)));
    unwrap!(spawner.spawn(vibration_task(vibrator)));
    unwrap!(spawner.spawn(bluetooth_task(sd, server)));
}
