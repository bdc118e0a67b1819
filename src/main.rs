use stress_test::{stress_test_scaling, stress_test_writes};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            ASYNC STRESS TESTS                               ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: few replicas, hot keys
    let stats = stress_test_writes(4, 100, 10, 200).await?;
    stats.print();

    // Test 2: few replicas, mostly disjoint keys
    let stats = stress_test_writes(4, 100, 1000, 200).await?;
    stats.print();

    // Test 3: medium scale
    let stats = stress_test_writes(10, 500, 200, 1000).await?;
    stats.print();

    // Test 4: scaling analysis
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS                                  ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_scaling(20, 2).await?;

    println!("\n✓ All stress tests completed successfully!");
    Ok(())
}
