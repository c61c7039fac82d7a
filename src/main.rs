use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use std::path::PathBuf;

use eleventa::{Catalog, Dashboard};

/// Turns Eleventa point-of-sale CSV exports into a JSON catalog, a price
/// list, and sales-dashboard data.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Builds the JSON product catalog and the WhatsApp price list
    Catalog {
        /// Catalog export to read
        #[arg(short, long, default_value = "eleventa_export_demo.csv")]
        input: PathBuf,

        /// Where to write the JSON catalog
        #[arg(long, default_value = "public/catalog.json")]
        json: PathBuf,

        /// Where to write the price list
        #[arg(long, default_value = "catalogo_whatsapp.txt")]
        text: PathBuf,

        /// Also print the price list
        #[arg(short, long)]
        print: bool,
    },
    /// Builds the sales-dashboard data
    Dashboard {
        /// Sales export to read
        #[arg(short, long, default_value = "ventas_eleventa.csv")]
        input: PathBuf,

        /// Where to write the dashboard data
        #[arg(short, long, default_value = "public/dashboard_data.json")]
        output: PathBuf,

        /// Also print a summary of the best-selling products
        #[arg(short, long)]
        print: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    match args.command {
        Command::Catalog {
            input,
            json,
            text,
            print,
        } => {
            let mut catalog = Catalog::new();
            catalog
                .read_csv(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            catalog.write(&json, &text).context("writing catalog")?;
            if print {
                println!("{catalog}");
            }
            let available = catalog.items().iter().filter(|i| i.available).count();
            println!(
                "✅ Generado {} y {} ({} productos, {available} disponibles)",
                json.display(),
                text.display(),
                catalog.items().len(),
            );
        }
        Command::Dashboard {
            input,
            output,
            print,
        } => {
            let mut dashboard = Dashboard::new();
            dashboard
                .read_csv(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            dashboard
                .write(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            if print {
                print!("{dashboard}");
            }
            println!(
                "✅ Dashboard data generada en {} (ventas: ${}, unidades: {})",
                output.display(),
                dashboard.total_sales(),
                dashboard.total_units(),
            );
        }
    }
    Ok(())
}
