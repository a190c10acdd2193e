use site_load_manager::*;

use tracing_subscriber::EnvFilter;

fn main() -> Result<(), LoadManagerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .without_time()
        .init();

    println!("Site Load Manager - Example Usage\n");

    let config = match std::env::args().nth(1) {
        Some(path) => SiteConfig::load(path)?,
        None => SiteConfig::demo(),
    };
    let mut manager = LoadManager::new(config)?;
    let mut demand = RandomDemand::new();

    println!("=== Plugging in three vehicles ===");
    for _ in 0..3 {
        if let Some(id) = manager.plug_in_next(&mut demand) {
            print_transfers(&manager, &format!("plug in {}", id));
        }
    }
    print!("{}", manager.report());

    println!("\n=== Stall 2 raised to priority 5 ===");
    manager.set_priority(2, 5)?;
    print_transfers(&manager, "priority change");
    print!("{}", manager.report());

    println!("\n=== Peak shaving on ===");
    manager.set_capacity_mode(CapacityMode::Constrained)?;
    print_transfers(&manager, "constrained");
    print!("{}", manager.report());

    println!("\n=== Re-rolling requests ===");
    manager.randomize_requests(&mut demand);
    print_transfers(&manager, "randomize");
    print!("{}", manager.report());

    println!("\n=== Last vehicle leaves ===");
    if let Some(id) = manager.unplug_last() {
        print_transfers(&manager, &format!("unplug {}", id));
    }
    print!("{}", manager.report());

    let violations = manager.check_violations();
    if violations.is_empty() {
        println!("\n✓ All allocation checks pass");
    } else {
        for violation in &violations {
            println!(
                "[{:?}] {} - {}",
                violation.severity, violation.check_name, violation.description
            );
        }
    }

    println!("\n=== Snapshot (JSON) ===");
    match serde_json::to_string_pretty(manager.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize snapshot: {}", e),
    }

    Ok(())
}

fn print_transfers(manager: &LoadManager, label: &str) {
    let transfers = manager.last_diff().transfers();
    if transfers.is_empty() {
        println!("  [{}] no block movement", label);
        return;
    }
    for transfer in transfers {
        println!("  [{}] {}", label, transfer.description());
    }
}
