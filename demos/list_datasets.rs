use anyhow::Result;
use argilla_client::{Client, Parsed, datasets};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Example program that calls the library API.
    // Configure the server via env vars or a `.argillarc` file.
    // RUST_LOG=argilla_client=debug shows every request.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Client::from_env()?;

    let Some(list) = datasets::list_datasets(&client)?.into_result()? else {
        return Ok(());
    };

    for ds in list {
        let records = datasets::get_records(&client, &ds.id, None, Some(5))?;
        match records.parsed {
            Some(Parsed::Success(page)) => println!(
                "{} ({}) {:?}: {} record(s) on first page",
                ds.name,
                ds.id,
                ds.status,
                page.items.len()
            ),
            Some(Parsed::Error(e)) => eprintln!("{}: HTTP {}: {}", ds.name, records.status_code, e),
            None => {}
        }
    }
    Ok(())
}
