//! Board output bytes through the bridge into the history

use std::io::Cursor;

use greensat_bridge::clock::parse_timestamp;
use greensat_bridge::{BlockingLineSource, FixedClock, HistoryStore, IngestLoop, TransportError};
use greensat_core::reading::{Measurement, Reading};
use greensat_core::{SensorFault, TelemetryEmitter};

fn healthy() -> Reading {
    Reading {
        temperature_c: Measurement::Valid(22.5),
        humidity_pct: Measurement::Valid(40.3),
        gas_pct: Measurement::Valid(5.43),
        gas_raw: Some(12_000),
        lux: Measurement::Valid(300.0),
        pressure_hpa: Measurement::Valid(1013.2),
    }
}

#[tokio::test]
async fn producer_lines_land_in_history() {
    let mut emitter = TelemetryEmitter::new(Vec::<u8>::new());
    emitter.emit(&healthy()).unwrap();

    let mut degraded = healthy();
    degraded.lux = Measurement::Fault(SensorFault::Bus { sensor: "BH1750" });
    emitter.emit(&degraded).unwrap();

    // Boot chatter and a line cut by a reset, as seen on a real port
    let mut wire = b"rst:0x1 (POWERON_RESET)\n{\"temp\":2".to_vec();
    wire.push(b'\n');
    wire.extend_from_slice(&emitter.into_inner());

    let store = HistoryStore::in_memory().await.unwrap();
    let source = BlockingLineSource::new(Cursor::new(wire));
    let clock = FixedClock::at("2024-05-01 12:00:00").unwrap();
    let mut ingest = IngestLoop::new(source, store.clone(), clock);

    let result = ingest.run_until(std::future::pending()).await;
    assert!(matches!(result, Err(TransportError::Closed)));

    let stats = ingest.stats();
    assert_eq!(stats.lines_received, 4);
    assert_eq!(stats.total_discarded(), 2);
    assert_eq!(stats.persisted, 2);

    let rows = store.recent(10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].temperature_c, Some(22.5));
    assert_eq!(rows[0].gas_pct, Some(5.43));
    assert_eq!(rows[0].air_quality_pct, Some(94.6));
    assert_eq!(rows[0].lux, Some(300.0));
    assert_eq!(rows[1].lux, None);
    assert_eq!(rows[1].pressure_hpa, Some(1013.2));
}

#[tokio::test]
async fn faulted_pressure_does_not_drag_daily_mean() {
    let mut emitter = TelemetryEmitter::new(Vec::<u8>::new());
    let mut first = healthy();
    first.pressure_hpa = Measurement::Valid(1000.0);
    emitter.emit(&first).unwrap();

    let mut degraded = healthy();
    degraded.pressure_hpa = Measurement::Fault(SensorFault::Bus { sensor: "BMP280" });
    degraded.gas_pct = Measurement::Fault(SensorFault::NotCalibrated { sensor: "MQ-2" });
    emitter.emit(&degraded).unwrap();

    let store = HistoryStore::in_memory().await.unwrap();
    let source = BlockingLineSource::new(Cursor::new(emitter.into_inner()));
    let clock = FixedClock::at("2024-05-01 12:00:00").unwrap();
    let mut ingest = IngestLoop::new(source, store.clone(), clock);
    let _ = ingest.run_until(std::future::pending()).await;

    let rows = store.recent(10).await.unwrap();
    assert_eq!(rows[1].pressure_hpa, None);
    assert_eq!(rows[1].gas_pct, None);
    assert_eq!(rows[1].air_quality_pct, None);

    let days = store
        .daily_means(
            parse_timestamp("2024-05-01 00:00:00").unwrap(),
            parse_timestamp("2024-05-01 23:59:59").unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].samples, 2);
    assert_eq!(days[0].pressure_hpa, Some(1000.0));
    assert_eq!(days[0].air_quality_pct, Some(94.6));
}
