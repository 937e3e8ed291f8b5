use hue_bridge_driver::{BridgeClient, BusEvent, ChannelBus, DriverConfig, HueDriver};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let serial = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0000DEMO0000".to_string());

    let config = DriverConfig::default();
    let controller = Arc::new(BridgeClient::new(&config.bridge)?);
    let bus = Arc::new(ChannelBus::new());
    let mut events = bus.subscribe();

    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                BusEvent::LightRegistered(light) => {
                    println!("+ {} {} ({})", light.id, light.name, light.model_id)
                }
                BusEvent::State { light, state } => println!("  {} {:?}", light, state),
                BusEvent::Notification(n) => println!("! {}: {}", n.title, n.subtitle),
            }
        }
    });

    let mut driver = HueDriver::start(config, &serial, controller, bus.clone()).await?;
    println!(
        "Paired with {} as {}, serving {} light(s). Ctrl-C to quit.",
        driver.session().bridge,
        driver.session().username,
        driver.lights().count()
    );

    tokio::signal::ctrl_c().await?;
    driver.stop().await;
    printer.abort();
    Ok(())
}
