use std::{convert::Infallible, env, fs::File, io::Write, path::Path, process};

use dicom_volume_stream::{Catalog, CatalogConfig, CatalogError, byte_stream};
use futures::StreamExt;
use tracing::{error, info};

const USAGE: &str = "usage: dicom-volume-stream <config.yaml | resource-dir> \
[volume <name> <out> | tf <name> <out> | preview <name> <out.png>]";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(source) = args.first() else {
        eprintln!("{USAGE}");
        process::exit(2);
    };

    if let Err(e) = run(source, &args[1..]).await {
        error!("{e}");
        process::exit(1);
    }
}

async fn run(source: &str, command: &[String]) -> Result<(), CatalogError> {
    let config = if Path::new(source).is_dir() {
        CatalogConfig::with_resource_path(source)
    } else {
        info!("Loading configuration from: {source}");
        CatalogConfig::from_file(source)?
    };
    let catalog = Catalog::from_directory(&config)?;

    match command {
        [] => {
            println!("{}", catalog.volumes_json()?);
            println!("{}", catalog.transfer_functions_json()?);
        }
        [kind, name, out] if kind == "volume" => {
            let chunks = byte_stream::into_async_stream(
                catalog.stream_volume(name)?,
                config.stream_buffer,
            );
            let written = write_stream(chunks, out).await?;
            info!("Wrote {written} bytes of volume {name} to {out}");
        }
        [kind, name, out] if kind == "tf" => {
            let tf = catalog
                .transfer_function(name)
                .ok_or_else(|| CatalogError::NotFound(name.clone()))?;
            let chunks = byte_stream::into_async_stream(
                tf.stream_colour_data().map(Ok::<_, Infallible>),
                config.stream_buffer,
            );
            let written = write_stream(chunks, out).await?;
            info!("Wrote {written} bytes of transfer function {name} to {out}");
        }
        [kind, name, out] if kind == "preview" => {
            let tf = catalog
                .transfer_function(name)
                .ok_or_else(|| CatalogError::NotFound(name.clone()))?;
            tf.save_preview(out, 50)?;
            info!("Wrote preview of transfer function {name} to {out}");
        }
        _ => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    }
    Ok(())
}

async fn write_stream<S, E>(chunks: S, out: &str) -> Result<usize, CatalogError>
where
    S: futures::Stream<Item = Result<bytes::Bytes, E>>,
    CatalogError: From<E>,
{
    let mut file = File::create(out)?;
    let mut written = 0;
    let mut chunks = std::pin::pin!(chunks);
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        written += chunk.len();
    }
    Ok(written)
}
