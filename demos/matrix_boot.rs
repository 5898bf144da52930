//! Boot an 8×8 WS2812 matrix on GPIO 3: startup sweep, banner, then wait for the
//! network link and show the assigned address or a timeout.
//!
//! A button from GPIO 13 to GND switches the LEDs off and on; drawing carries on in the
//! shadow buffer while they are dark.
//!
//! The network stack is not part of this crate. Whatever brings the link up calls
//! `LINK.publish(address)` and hands request bodies to
//! [`matrix_envoy::pixel_update::handle_pixel_update`]. With nothing publishing, the boot
//! ends on the timeout path and the board restarts after five seconds.
#![no_std]
#![no_main]

use core::convert::Infallible;

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{InterruptHandler, Pio};
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};
use embassy_time::{Delay, Duration};
use matrix_envoy::{Error, Result};
use matrix_envoy::button::{DisplayPowerController, PowerConfig};
use matrix_envoy::connectivity::{
    BootConfig, ConnectionState, ConnectivityStateMachine, NetworkLink, TimeoutPolicy,
};
use matrix_envoy::led2d::MATRIX_LEN;
use matrix_envoy::matrix::MatrixRenderer;
use panic_probe as _;
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
});

type Strip = PioWs2812<'static, PIO0, 0, MATRIX_LEN>;

const BOOT_CONFIG: BootConfig = BootConfig::new()
    .with_timeout_policy(TimeoutPolicy::RestartAfter(Duration::from_millis(5_000)));

static LINK: NetworkLink = NetworkLink::new();
static RENDERER: StaticCell<MatrixRenderer<Strip>> = StaticCell::new();
static PROGRAM: StaticCell<PioWs2812Program<'static, PIO0>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    core::panic!("{err}");
}

async fn inner_main(spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    let program = PROGRAM.init(PioWs2812Program::new(&mut common));
    let strip: Strip = PioWs2812::new(&mut common, sm0, p.DMA_CH0, p.PIN_3, program);
    let renderer: &'static MatrixRenderer<Strip> = RENDERER.init(MatrixRenderer::new(strip));

    let button = Input::new(p.PIN_13, Pull::Up);
    let token = power_task(renderer, button);
    spawner.spawn(token).map_err(Error::TaskSpawn)?;

    let mut boot = ConnectivityStateMachine::new(renderer, &LINK, Delay, BOOT_CONFIG);
    let state = boot.run_boot().await?;
    if state == ConnectionState::Connected {
        info!("pixel updates accepted from here on");
    }

    let restart = boot.hold().await;
    info!("restarting after {} ms", restart.after.as_millis());
    cortex_m::peripheral::SCB::sys_reset()
}

#[embassy_executor::task]
async fn power_task(renderer: &'static MatrixRenderer<Strip>, button: Input<'static>) -> ! {
    let config = PowerConfig::new().with_start_on(true);
    let mut controller = DisplayPowerController::new(renderer, button, Delay, config);
    let err = controller.run().await.unwrap_err();
    core::panic!("{err}");
}
