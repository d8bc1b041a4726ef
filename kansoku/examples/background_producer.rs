use std::{sync::Arc, thread, time::Duration};

use kansoku::*;

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let sensor = Arc::new(EventHub::new(["Reading", "Stopped"]));
    let monitor = Monitor::with_config(
        &sensor,
        MonitorConfig::default().with_settle_timeout(Duration::from_secs(2)),
    )?;

    // Raise events from a plain thread, as a device driver would
    let producer = {
        let sensor = sensor.clone();
        thread::spawn(move || {
            for i in 0..10u32 {
                thread::sleep(Duration::from_millis(20));
                sensor.raise("Reading", params![i as f64 * 0.5]);
            }
            sensor.raise("Stopped", params![]);
        })
    };

    let readings = monitor.recording_for("Reading")?;
    readings.settle_on(|r| r.count() >= 5).await?;
    println!("Got {} readings so far", readings.count());

    monitor
        .recording_for("Stopped")?
        .settle_on(|r| r.any())
        .within(Duration::from_secs(5))
        .await?;
    println!("Producer stopped after {} readings", readings.count());

    let high = readings.clone().with_args::<f64, _>(|v| *v >= 3.0)?;
    println!("{} readings at or above 3.0", high.count());

    producer.join().ok();
    Ok(())
}
