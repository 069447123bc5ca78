#![cfg_attr(target_os = "none", no_main)]
#![cfg_attr(target_os = "none", no_std)]

#[cfg(target_os = "none")]
use defmt_rtt as _; // global logger
#[cfg(target_os = "none")]
use panic_probe as _; // panic handler

#[cfg(target_os = "none")]
#[rtic::app(
    device = thermo_hal::pac,
    dispatchers = [SPI1]
)]
mod app {
    use rtic_monotonics::systick::*;
    use thermo_hal::system::CLK_FREQ;
    use thermo_hal::{AcquisitionConfig, Adc, CalibrationProfile, LpDelay, System, Thermo};

    /// Time between scans (s)
    const SCAN_PERIOD: u32 = 10;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        thermo: Thermo<Adc, LpDelay>,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        defmt::info!("init");

        let dp = cx.device;
        let cp = cx.core;

        let mut pwr = dp.PWR;
        let mut sys = System::configure(dp.RCC, &mut pwr);

        // Ticks at 100 Hz (`systick-100hz`), every tick wakes the core
        let systick_token = rtic_monotonics::create_systick_token!();
        Systick::start(cp.SYST, CLK_FREQ as u32, systick_token);

        let adc = Adc::new(dp.ADC, dp.GPIOB, &mut sys);
        let delay = LpDelay::configure(dp.LPTIM, &mut sys);

        let thermo = Thermo::new(
            adc,
            delay,
            *CalibrationProfile::factory(),
            AcquisitionConfig::default(),
        );

        if scan::spawn().is_err() {
            defmt::error!("scan already running");
        }

        (Shared {}, Local { thermo })
    }

    #[task(local = [thermo], priority = 1)]
    async fn scan(cx: scan::Context) {
        let thermo = cx.local.thermo;

        loop {
            let scan = thermo.scan();

            defmt::info!(
                "zero {} thermistor {} channels {}",
                scan.zero,
                scan.thermistor,
                scan.channels
            );

            Systick::delay(SCAN_PERIOD.secs()).await;
        }
    }

    #[task(binds = ADC_COMP, priority = 2)]
    fn adc(_: adc::Context) {
        thermo_hal::adc::on_interrupt();
    }

    #[task(binds = LPTIM1, priority = 2)]
    fn lptim(_: lptim::Context) {
        thermo_hal::delay::on_compare();
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
