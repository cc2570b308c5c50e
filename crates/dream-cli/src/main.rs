// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Command Line Front End
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use clap::{Parser, Subcommand, ValueEnum};
use dream_output::{DreamOutput, FluidQuantity};
use dream_settings::ions::Ions;
use dream_settings::spi::{PelletInjection, SpiSettings};
use dream_settings::DreamSettings;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Prepare DREAM settings and inspect DREAM output", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shatter a pellet and write the resulting shard and ion settings
    Spi {
        /// JSON description of the pellet injection
        #[arg(short, long)]
        pellet: PathBuf,

        /// Settings file to extend; when omitted only the SPI and ion
        /// sections are written
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Where to write the settings
        #[arg(short, long)]
        output: PathBuf,

        /// Seed for the shard sampler
        #[arg(long)]
        seed: Option<u64>,

        /// Replace existing shards instead of adding to them
        #[arg(long, default_value_t = false)]
        replace: bool,
    },

    /// Print a quantity from an output file
    Inspect {
        /// Output file (.npz)
        file: PathBuf,

        /// Name of the quantity, e.g. E_field or n_re
        quantity: String,

        /// Normalize the electric field to Eceff, Ecfree, Ectot (Ec) or EDreic (ED)
        #[arg(long)]
        norm: Option<String>,

        /// Print a profile instead of the raw data
        #[arg(long, value_enum)]
        profile: Option<Profile>,

        /// Radial index (negative counts from the end)
        #[arg(short, long, allow_hyphen_values = true)]
        r: Option<isize>,

        /// Time index (negative counts from the end)
        #[arg(short, long, allow_hyphen_values = true)]
        t: Option<isize>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Profile {
    Radial,
    Time,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    match args.command {
        Command::Spi {
            pellet,
            settings,
            output,
            seed,
            replace,
        } => run_spi(pellet, settings, output, seed, replace),
        Command::Inspect {
            file,
            quantity,
            norm,
            profile,
            r,
            t,
        } => run_inspect(file, &quantity, norm.as_deref(), profile, r, t),
    }
}

fn run_spi(
    pellet: PathBuf,
    settings: Option<PathBuf>,
    output: PathBuf,
    seed: Option<u64>,
    replace: bool,
) -> Result<(), Box<dyn Error>> {
    let pellet: PelletInjection = serde_json::from_str(&std::fs::read_to_string(&pellet)?)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match settings {
        Some(path) => {
            let mut ds = DreamSettings::load(&path)?;
            let kp = ds.eqsys.spi.set_params_vallhagen_msc(
                &pellet,
                &mut ds.eqsys.n_i,
                !replace,
                &mut rng,
            )?;
            ds.save(&output)?;
            info!(kp, shards = ds.eqsys.spi.n_shard(), "pellet added to settings");
        }
        None => {
            let mut spi = SpiSettings::default();
            let mut ions = Ions::default();
            let kp = spi.set_params_vallhagen_msc(&pellet, &mut ions, true, &mut rng)?;
            spi.verify_settings()?;
            let data = serde_json::json!({
                "spi": spi.to_dict()?,
                "n_i": ions.to_dict()?,
            });
            std::fs::write(&output, serde_json::to_string_pretty(&data)?)?;
            info!(kp, shards = spi.n_shard(), "pellet sections written");
        }
    }
    Ok(())
}

fn run_inspect(
    file: PathBuf,
    quantity: &str,
    norm: Option<&str>,
    profile: Option<Profile>,
    r: Option<isize>,
    t: Option<isize>,
) -> Result<(), Box<dyn Error>> {
    let out = DreamOutput::load(&file)?;

    let q: FluidQuantity = match norm {
        Some(to) if quantity == dream_output::electric_field::E_FIELD => {
            out.e_field()?.normalize(to)?
        }
        Some(_) => return Err(format!("Only the electric field can be normalized, not '{quantity}'.").into()),
        None => out.quantity(quantity)?.clone(),
    };

    println!("{q}");
    match profile {
        Some(Profile::Radial) => {
            let plot = q.radial_profile_plot(t.unwrap_or(dream_output::fluid_quantity::DEFAULT_PROFILE_TIME))?;
            print!("{}", plot.to_table());
        }
        Some(Profile::Time) => {
            let plot = q.time_profile_plot(r.unwrap_or(dream_output::fluid_quantity::DEFAULT_PROFILE_RADIUS))?;
            print!("{}", plot.to_table());
        }
        None => println!("{}", q.dumps(r, t)?),
    }
    Ok(())
}
