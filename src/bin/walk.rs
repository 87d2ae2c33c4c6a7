//! Walk generator - emits a straight-line location feed
//!
//! Prints a permission grant followed by evenly spaced location fixes between
//! two points, one JSON object per line, ready to pipe into the tracker.
//!
//! Usage:
//!   cargo run --bin riskzone-walk -- --from 40.8880,31.1680 --to 40.9100,31.1780 --steps 40 \
//!     | cargo run --bin riskzone-tracker -- --config config/dev.toml

use clap::Parser;
use riskzone_tracker::domain::Coordinate;
use serde_json::json;
use std::io::{self, Write};
use std::time::Duration;

/// Emit a simulated walk as tracker feed lines
#[derive(Parser, Debug)]
#[command(name = "riskzone-walk", version, about)]
struct Args {
    /// Start point as "lat,lon"
    #[arg(long, value_parser = parse_coordinate)]
    from: Coordinate,

    /// End point as "lat,lon"
    #[arg(long, value_parser = parse_coordinate)]
    to: Coordinate,

    /// Number of segments between start and end
    #[arg(long, default_value_t = 10)]
    steps: u32,

    /// Delay between emitted fixes (0 emits as fast as possible)
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,

    /// Timestamp of the first fix in epoch milliseconds
    #[arg(long, default_value_t = 1_700_000_000_000)]
    start_ts: u64,

    /// Timestamp increment between fixes
    #[arg(long, default_value_t = 1000)]
    ts_step_ms: u64,

    /// Skip the leading permission grant
    #[arg(long)]
    no_permission: bool,
}

fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{}\"", s))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {}", e))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("bad longitude: {}", e))?;
    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(format!("coordinate out of range: {}", coordinate));
    }
    Ok(coordinate)
}

/// Linear interpolation; adequate for walks of a few kilometres
fn interpolate(from: Coordinate, to: Coordinate, t: f64) -> Coordinate {
    Coordinate::new(from.lat + (to.lat - from.lat) * t, from.lon + (to.lon - from.lon) * t)
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let steps = args.steps.max(1);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !args.no_permission {
        writeln!(out, "{}", json!({ "type": "permission", "state": "granted" }))?;
    }

    for i in 0..=steps {
        let point = interpolate(args.from, args.to, f64::from(i) / f64::from(steps));
        let ts = args.start_ts + u64::from(i) * args.ts_step_ms;
        writeln!(
            out,
            "{}",
            json!({ "type": "location", "lat": point.lat, "lon": point.lon, "ts": ts })
        )?;
        out.flush()?;

        if args.interval_ms > 0 && i < steps {
            std::thread::sleep(Duration::from_millis(args.interval_ms));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        let c = parse_coordinate("40.7355, 31.6061").unwrap();
        assert_eq!(c.lat, 40.7355);
        assert_eq!(c.lon, 31.6061);

        assert!(parse_coordinate("40.7355").is_err());
        assert!(parse_coordinate("abc,31").is_err());
        assert!(parse_coordinate("91,0").is_err());
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = Coordinate::new(40.0, 31.0);
        let b = Coordinate::new(41.0, 32.0);
        assert_eq!(interpolate(a, b, 0.0), a);
        assert_eq!(interpolate(a, b, 1.0), b);
        let mid = interpolate(a, b, 0.5);
        assert!((mid.lat - 40.5).abs() < 1e-12);
        assert!((mid.lon - 31.5).abs() < 1e-12);
    }
}
