use std::path::PathBuf;

use clap::Parser;
use sheetris::config::PackerConfig;
use sheetris::packer::Algorithm;
use sheetris::render;
use sheetris::solver::Solver;
use sheetris::types::{Demand, Rect, Solution};
use tracing::Level;

#[derive(Parser)]
#[command(name = "sheetris", about = "Pack rectangular parts onto stock sheets")]
struct Cli {
    /// Stock sheet dimensions as WxL (default: 1220x2440)
    #[arg(long)]
    stock: Option<String>,

    /// Parts as WxH:qty, optionally @thickness (e.g. 800x600:3 400x300:5@18)
    #[arg(long = "cuts", num_args = 1..)]
    cuts: Vec<String>,

    /// Blade kerf width in mm (default: 3)
    #[arg(long)]
    kerf: Option<f64>,

    /// Packing algorithm: guillotine, maxrects, or skyline (default: maxrects)
    #[arg(long, value_parser = parse_algorithm)]
    algorithm: Option<Algorithm>,

    /// Disable piece rotation
    #[arg(long)]
    no_rotate: bool,

    /// Show ASCII layout of each sheet
    #[arg(long)]
    layout: bool,

    /// Print the solution as JSON
    #[arg(long)]
    json: bool,

    /// JSON file with sheet_width, sheet_length, kerf, algorithm, allow_rotate
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log each packed group to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_algorithm(s: &str) -> Result<Algorithm, String> {
    s.parse::<Algorithm>().map_err(|e| e.to_string())
}

fn parse_dimensions(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let w = parts[0]
        .parse::<f64>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let h = parts[1]
        .parse::<f64>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    let rect = Rect::new(w, h);
    if !rect.is_valid() {
        return Err(format!("dimensions must be positive in '{}'", s));
    }
    Ok(rect)
}

fn parse_cut(s: &str, allow_rotate: bool) -> Result<Demand, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid cut '{}', expected WxH:qty[@thickness]", s));
    }
    let rect = parse_dimensions(parts[0])?;
    let (qty, thickness) = match parts[1].split_once('@') {
        Some((qty, thickness)) => {
            let thickness = thickness
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite() && *t >= 0.0)
                .ok_or_else(|| format!("invalid thickness in '{}'", s))?;
            (qty, thickness)
        }
        None => (parts[1], 0.0),
    };
    let qty = qty
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    if qty == 0 {
        return Err(format!("quantity must be non-zero in '{}'", s));
    }
    Ok(Demand {
        allow_rotate,
        thickness,
        ..Demand::new(rect, qty)
    })
}

fn load_config(cli: &Cli) -> Result<PackerConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            PackerConfig::from_json(&text)?
        }
        None => PackerConfig::default(),
    };

    if let Some(stock) = &cli.stock {
        let stock = parse_dimensions(stock)?;
        config.sheet_width = stock.w;
        config.sheet_length = stock.h;
    }
    if let Some(kerf) = cli.kerf {
        config.kerf = kerf;
    }
    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm;
    }
    if cli.no_rotate {
        config.allow_rotate = false;
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn print_solution(solution: &Solution, layout: bool) {
    let multiple_groups = solution.groups.len() > 1;
    for group in &solution.groups {
        if multiple_groups || group.thickness > 0.0 {
            println!("== Thickness {} ==", group.thickness);
        }
        for sheet in &group.sheets {
            println!("Sheet {}:", sheet.index + 1);
            for piece in &sheet.placements {
                let p = &piece.placement;
                let rot = if p.rotated { " [rotated]" } else { "" };
                println!("  {} {} @ ({}, {}){}", piece.label, p.rect, p.x, p.y, rot);
            }
            if layout {
                print!("{}", render::render_sheet(solution.stock, &sheet.placements));
            }
            println!();
        }

        if !group.unplaced.is_empty() {
            println!("Unplaced:");
            for piece in &group.unplaced {
                println!("  {} {}: {}", piece.label, piece.rect, piece.reason);
            }
            println!();
        }

        println!("Cut list:");
        for entry in &group.cut_list {
            let names = if entry.names.is_empty() {
                String::new()
            } else {
                format!("  ({})", entry.names.join(", "))
            };
            println!("  {}  {} x{}{}", entry.letter, entry.dimension, entry.quantity, names);
        }
        println!();
    }

    let unplaced = solution.unplaced_count();
    println!(
        "Summary: {} sheet{} used, {:.1}% waste{}",
        solution.sheet_count(),
        if solution.sheet_count() == 1 { "" } else { "s" },
        solution.total_waste_percent(),
        if unplaced > 0 {
            format!(", {unplaced} unplaced")
        } else {
            String::new()
        },
    );
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::INFO } else { Level::WARN })
        .init();

    let config = load_config(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let demands: Vec<Demand> = cli
        .cuts
        .iter()
        .map(|c| parse_cut(c, config.allow_rotate))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let solution = Solver::new(config, demands).solve().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if cli.json {
        match serde_json::to_string_pretty(&solution) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_solution(&solution, cli.layout);
    }
}
