use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use hsi_annotator::data::header::{DataType, EnviHeader, Endian, Interleave};
use hsi_annotator::data::writer::write_cube;

#[derive(Parser, Debug)]
#[command(about = "Write synthetic hyperspectral cubes for trying out the annotator")]
struct Args {
    /// Directory to write cubes into
    #[arg(long, default_value = "data")]
    out: PathBuf,
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Reflectance of a material at wavelength `nm`.
#[derive(Clone, Copy)]
enum Material {
    Vegetation,
    Soil,
    Water,
}

impl Material {
    fn reflectance(self, nm: f64) -> f64 {
        match self {
            // Green bump, red absorption, then the red edge into the NIR plateau.
            Material::Vegetation => {
                let edge = 0.45 / (1.0 + (-(nm - 715.0) / 12.0).exp());
                0.04 + gaussian(nm, 550.0, 30.0, 0.08) + edge
            }
            Material::Soil => 0.1 + 0.25 * (nm - 400.0) / 600.0,
            Material::Water => 0.08 * (-(nm - 400.0) / 150.0).exp() + 0.01,
        }
    }
}

/// Regions: left third vegetation, a water disc, soil elsewhere.
fn material_at(row: usize, col: usize, lines: usize, samples: usize) -> Material {
    let (cy, cx) = (lines as f64 * 0.5, samples as f64 * 0.7);
    let r = (lines.min(samples) as f64) * 0.25;
    let d2 = (row as f64 - cy).powi(2) + (col as f64 - cx).powi(2);
    if d2 < r * r {
        Material::Water
    } else if col < samples / 3 {
        Material::Vegetation
    } else {
        Material::Soil
    }
}

/// Row-major `(row, column, band)` samples for a synthetic scene.
fn scene(
    lines: usize,
    samples: usize,
    wavelengths: &[f64],
    gain: f64,
    noise: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    let mut out = Vec::with_capacity(lines * samples * wavelengths.len());
    for row in 0..lines {
        for col in 0..samples {
            let material = material_at(row, col, lines, samples);
            for &nm in wavelengths {
                out.push((material.reflectance(nm) + rng.gauss(0.0, noise)) * gain);
            }
        }
    }
    out
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(42);

    // 100 bands, 400 → 994 nm
    let wavelengths: Vec<f64> = (0..100).map(|i| 400.0 + i as f64 * 6.0).collect();

    // Float reflectance, band sequential.
    let mut header = EnviHeader::new(48, 64, wavelengths.len(), DataType::F32);
    header.wavelengths = Some(wavelengths.clone());
    header.wavelength_units = Some("Nanometers".into());
    header.description = Some("Synthetic field scene".into());
    let data = scene(48, 64, &wavelengths, 1.0, 0.005, &mut rng);
    write_cube(&args.out, "field/plot_01", &header, &data)?;

    // Scaled integers, line interleaved, big endian.
    let mut header = EnviHeader::new(40, 40, wavelengths.len(), DataType::U16);
    header.interleave = Interleave::Bil;
    header.byte_order = Endian::Big;
    header.wavelengths = Some(wavelengths.clone());
    let data = scene(40, 40, &wavelengths, 10_000.0, 0.003, &mut rng);
    write_cube(&args.out, "field/plot_02", &header, &data)?;

    // No wavelength metadata: the annotator falls back to band indices.
    let bands: Vec<f64> = (0..30).map(|i| 420.0 + i as f64 * 20.0).collect();
    let mut header = EnviHeader::new(32, 32, bands.len(), DataType::I16);
    header.interleave = Interleave::Bip;
    let data = scene(32, 32, &bands, 1_000.0, 0.01, &mut rng);
    write_cube(&args.out, "lab/no_wavelengths", &header, &data)?;

    println!("Wrote 3 cubes to {}", args.out.display());
    Ok(())
}
