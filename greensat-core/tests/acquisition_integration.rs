//! Integration tests for the producer side
//!
//! Real drivers on fake buses, from the first register read to the JSON line
//! on the serial port.

mod common;

use greensat_core::constants::{BH1750_ADDRESS, BMP280_ADDRESS};
use greensat_core::reading::ClimateSample;
use greensat_core::{
    AcquisitionConfig, AlarmAction, Bh1750, Bmp280, Buzzer, Field, GasEstimator, Producer,
    ReadingAggregator, SensorFault, SensorResult, TelemetryFrame,
};

use common::{CountingDelay, EdgeCounter, FixedClimate, LightDevice, RegisterDevice, ScriptedAdc};

fn calibrated_gas(idle: u16, then: u16) -> GasEstimator<ScriptedAdc> {
    let config = AcquisitionConfig::default();
    let mut script: Vec<SensorResult<u16>> =
        vec![Ok(idle); config.gas_calibration_samples as usize];
    script.push(Ok(then));

    let mut gas = GasEstimator::new(ScriptedAdc::new(&script));
    let mut delay = CountingDelay::default();
    gas.calibrate(
        &mut delay,
        config.gas_calibration_samples,
        config.gas_calibration_interval_ms,
    )
    .unwrap();
    assert_eq!(delay.total_ms, config.calibration_time_ms());
    gas
}

fn frames(out: &[u8]) -> Vec<TelemetryFrame> {
    std::str::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn healthy_board_emits_one_complete_line_per_cycle() {
    let config = AcquisitionConfig::default();
    let mut bmp_bus = RegisterDevice::bmp280();
    let mut light_bus = LightDevice::new(360);
    let mut pin = EdgeCounter::default();
    let mut out: Vec<u8> = Vec::new();

    {
        let aggregator = ReadingAggregator::new(
            calibrated_gas(2_000, 2_543),
            FixedClimate(Ok(ClimateSample { temperature_c: 22.5, humidity_pct: 40.0 })),
            Bh1750::new(&mut light_bus, CountingDelay::default(), BH1750_ADDRESS),
            Bmp280::new(&mut bmp_bus, BMP280_ADDRESS),
        )
        .with_thresholds(config.thresholds);

        let buzzer = Buzzer::new(&mut pin, CountingDelay::default());
        let mut producer =
            Producer::new(aggregator, &mut out, buzzer, CountingDelay::default(), &config);

        producer.start();
        let cycle = producer.run_cycle();
        assert!(cycle.reading.is_complete());
        assert_eq!(cycle.alarm, AlarmAction::Quiet);
        assert_eq!(producer.emitter_stats().lines_written, 1);
    }

    let frames = frames(&out);
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.temp, 22.5);
    assert_eq!(frame.hum, 40.0);
    assert_eq!(frame.gaz_pct, 5.43);
    assert_eq!(frame.lux, 300.0);
    assert_eq!(frame.press, 1006.5);
    assert!(frame.faults.is_empty());

    // startup chirp only
    assert_eq!(pin.rising, 1);
    assert!(bmp_bus.writes.contains(&vec![0xF4, 0x27]));
    assert!(bmp_bus.writes.contains(&vec![0xF5, 0xA0]));
    assert_eq!(light_bus.commands, vec![0x01, 0x10]);
}

#[test]
fn start_calibrates_gas_before_first_cycle() {
    let config = AcquisitionConfig::default();
    let mut script: Vec<SensorResult<u16>> =
        vec![Ok(2_000); config.gas_calibration_samples as usize];
    script.push(Ok(2_543));

    let mut delay = CountingDelay::default();
    let mut out: Vec<u8> = Vec::new();

    {
        let aggregator = ReadingAggregator::new(
            GasEstimator::new(ScriptedAdc::new(&script)),
            FixedClimate(Ok(ClimateSample { temperature_c: 22.5, humidity_pct: 40.0 })),
            Bh1750::new(LightDevice::new(360), CountingDelay::default(), BH1750_ADDRESS),
            Bmp280::new(RegisterDevice::bmp280(), BMP280_ADDRESS),
        );
        let buzzer = Buzzer::new(EdgeCounter::default(), CountingDelay::default());
        let mut producer = Producer::new(aggregator, &mut out, buzzer, &mut delay, &config);

        producer.start();
        let cycle = producer.run_cycle();
        assert!(cycle.reading.is_complete());
    }

    assert_eq!(delay.total_ms, config.calibration_time_ms());
    let frames = frames(&out);
    assert_eq!(frames[0].gaz_pct, 5.43);
    assert!(frames[0].faults.is_empty());
}

#[test]
fn cycle_without_start_flags_gas_uncalibrated() {
    let config = AcquisitionConfig::default();
    let mut out: Vec<u8> = Vec::new();

    {
        let aggregator = ReadingAggregator::new(
            GasEstimator::new(ScriptedAdc::new(&[Ok(2_543)])),
            FixedClimate(Ok(ClimateSample { temperature_c: 22.5, humidity_pct: 40.0 })),
            Bh1750::new(LightDevice::new(360), CountingDelay::default(), BH1750_ADDRESS),
            Bmp280::new(RegisterDevice::bmp280(), BMP280_ADDRESS),
        );
        let buzzer = Buzzer::new(EdgeCounter::default(), CountingDelay::default());
        let mut producer =
            Producer::new(aggregator, &mut out, buzzer, CountingDelay::default(), &config);

        let cycle = producer.run_cycle();
        assert_eq!(
            cycle.reading.gas_pct.fault(),
            Some(SensorFault::NotCalibrated { sensor: "MQ-2" })
        );
        assert_eq!(cycle.reading.gas_raw, Some(2_543));
    }

    let frames = frames(&out);
    assert_eq!(frames[0].gaz_pct, 0.0);
    assert_eq!(frames[0].faults.as_slice(), &[Field::Gas]);
}

#[test]
fn degraded_board_keeps_cycling() {
    let config = AcquisitionConfig::default();
    let mut bmp_bus = RegisterDevice::bmp280();
    bmp_bus.reads_fail = true;
    let mut light_bus = LightDevice::new(120);
    let mut out: Vec<u8> = Vec::new();

    {
        let mut gas = GasEstimator::new(ScriptedAdc::new(&[]));
        assert_eq!(
            gas.calibrate(&mut CountingDelay::default(), 20, 100),
            Err(SensorFault::Bus { sensor: "MQ-2" })
        );

        let aggregator = ReadingAggregator::new(
            gas,
            FixedClimate(Err(SensorFault::InvalidData { sensor: "DHT11", reason: "checksum" })),
            Bh1750::new(&mut light_bus, CountingDelay::default(), BH1750_ADDRESS),
            Bmp280::new(&mut bmp_bus, BMP280_ADDRESS),
        );
        let buzzer = Buzzer::new(EdgeCounter::default(), CountingDelay::default());
        let mut producer =
            Producer::new(aggregator, &mut out, buzzer, CountingDelay::default(), &config);

        for _ in 0..3 {
            producer.run_cycle();
        }
        assert_eq!(producer.cycles(), 3);
    }

    let frames = frames(&out);
    assert_eq!(frames.len(), 3);
    for frame in frames {
        assert_eq!(frame.lux, 100.0);
        assert_eq!(frame.temp, 0.0);
        assert_eq!(frame.press, 0.0);
        assert_eq!(
            frame.faults.as_slice(),
            &[Field::Temperature, Field::Humidity, Field::Gas, Field::Pressure]
        );
    }
}

#[test]
fn gas_leak_sounds_the_alert() {
    let config = AcquisitionConfig::default();
    let mut pin = EdgeCounter::default();
    let mut out: Vec<u8> = Vec::new();

    {
        let aggregator = ReadingAggregator::new(
            calibrated_gas(1_000, 5_000),
            FixedClimate(Ok(ClimateSample { temperature_c: 40.0, humidity_pct: 30.0 })),
            Bh1750::new(LightDevice::new(0), CountingDelay::default(), BH1750_ADDRESS),
            Bmp280::new(RegisterDevice::bmp280(), BMP280_ADDRESS),
        );
        let buzzer = Buzzer::new(&mut pin, CountingDelay::default());
        let mut producer =
            Producer::new(aggregator, &mut out, buzzer, CountingDelay::default(), &config);

        assert_eq!(producer.run_cycle().alarm, AlarmAction::Alert);
    }

    assert_eq!(pin.rising, 3);
    assert!(!pin.high);
    assert_eq!(frames(&out)[0].gaz_pct, 40.0);
}

#[test]
fn heat_beeps_once() {
    let config = AcquisitionConfig::default();
    let mut pin = EdgeCounter::default();
    let mut out: Vec<u8> = Vec::new();

    {
        let aggregator = ReadingAggregator::new(
            calibrated_gas(1_000, 1_000),
            FixedClimate(Ok(ClimateSample { temperature_c: 36.0, humidity_pct: 30.0 })),
            Bh1750::new(LightDevice::new(0), CountingDelay::default(), BH1750_ADDRESS),
            Bmp280::new(RegisterDevice::bmp280(), BMP280_ADDRESS),
        );
        let buzzer = Buzzer::new(&mut pin, CountingDelay::default());
        let mut producer =
            Producer::new(aggregator, &mut out, buzzer, CountingDelay::default(), &config);

        assert_eq!(producer.run_cycle().alarm, AlarmAction::Beep);
    }

    assert_eq!(pin.rising, 1);
}
