use simulation::{SimConfig, TrafficSim};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(path = %path, "Loading simulation config");
            SimConfig::from_json_file(&path)?
        }
        None => SimConfig::default(),
    };

    let mut sim = TrafficSim::new(config)?;
    let report = sim.run();

    println!("Current Markets:");
    for user_id in sim.users().user_ids() {
        if let Some(user) = sim.users().get(user_id.as_str()) {
            println!("\n{}:{}", user_id, user.current_markets());
        }
    }
    println!("\n{}", sim.engine());
    println!("\n{}", sim.users());
    println!("\n{}", report);

    sim.tear_down();
    Ok(())
}
