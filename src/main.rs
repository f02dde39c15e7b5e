use std::collections::HashMap;
use std::process;

use clap::Parser;

mod countries;
mod drilldown;
mod explorer;
mod export;
mod geodata;
mod geometry;
mod palette;
mod sentiments;

use geodata::{GeodataClient, GeodataConfig};
use sentiments::UnmappedPolicy;

#[derive(Parser, Debug)]
#[command(name = "world_atlas")]
#[command(about = "Interactive world map colored by continent, with country drill-down")]
struct Args {
    /// Sentiment CSV to load (file path or http(s) URL)
    #[arg(long, default_value = "data/geo_sentiments.csv")]
    csv: String,

    /// Bundled low-resolution world boundaries (GeoJSON)
    #[arg(long, default_value = "data/worldLow.json")]
    world_map: String,

    /// Base URL serving detailed country maps as <asset>.json
    #[arg(long, default_value = "https://cdn.amcharts.com/lib/5/geodata/json")]
    geodata_url: String,

    /// Warn about CSV countries that have no map data instead of
    /// dropping them silently
    #[arg(long)]
    report_unmapped: bool,

    /// Render the world choropleth to this PNG file and exit
    #[arg(long)]
    export: Option<String>,

    /// Width of the exported image in pixels
    #[arg(long, default_value = "1600")]
    export_width: u32,

    /// Height of the exported image in pixels
    #[arg(long, default_value = "900")]
    export_height: u32,
}

fn main() {
    let args = Args::parse();

    let policy = if args.report_unmapped {
        UnmappedPolicy::Report
    } else {
        UnmappedPolicy::Drop
    };

    println!("Loading sentiment data from {}...", args.csv);
    let resolved = match sentiments::load_country_data(&args.csv, policy) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Failed to load sentiment data: {}", e);
            process::exit(1);
        }
    };
    println!(
        "Resolved {} countries ({} without map data)",
        resolved.entries.len(),
        resolved.unmapped.len()
    );

    println!("Loading world geometry from {}...", args.world_map);
    let world_layer = match geodata::load_world_layer(&args.world_map) {
        Ok(layer) => layer,
        Err(e) => {
            eprintln!("Failed to load world geometry: {}", e);
            process::exit(1);
        }
    };
    println!("World layer: {} regions", world_layer.shapes.len());

    // Headless snapshot mode: render and exit without the UI
    if let Some(ref path) = args.export {
        let colors = palette::ColorSet::new();
        let mut fills = HashMap::new();
        for (code, entry) in &resolved.entries {
            fills.insert(code.clone(), colors.get_index(entry.continent.palette_index()));
        }
        if let Err(e) = export::export_layer_image(
            &world_layer,
            &fills,
            args.export_width,
            args.export_height,
            path,
        ) {
            eprintln!("Failed to export map: {}", e);
            process::exit(1);
        }
        return;
    }

    let client = GeodataClient::new(GeodataConfig {
        base_url: args.geodata_url.clone(),
        ..GeodataConfig::default()
    });

    println!("Launching atlas explorer...");
    if let Err(e) = explorer::run_explorer(world_layer, resolved.entries, client) {
        eprintln!("Explorer error: {}", e);
    }
}
