//! Writes `sample_accidents.csv`: synthetic Medellín accidents with a share
//! of deliberately broken locations, for trying out the dashboard offline.

use anyhow::{Context, Result};

/// SplitMix64; good enough for scattering sample points.
struct SplitMix(u64);

impl SplitMix {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `(0, 1]`.
    fn unit(&mut self) -> f64 {
        ((self.next() >> 11) + 1) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }

    /// Normal sample around `center` (Box-Muller, sine branch).
    fn around(&mut self, center: f64, spread: f64) -> f64 {
        let radius = (-2.0 * self.unit().ln()).sqrt();
        let angle = std::f64::consts::TAU * self.unit();
        center + spread * radius * angle.sin()
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

/// (comuna, barrio, centre lat, centre lon)
const NEIGHBORHOODS: &[(&str, &str, f64, f64)] = &[
    ("La Candelaria", "Boston", 6.2466, -75.5592),
    ("La Candelaria", "San Benito", 6.2540, -75.5705),
    ("Laureles Estadio", "Laureles", 6.2450, -75.5960),
    ("El Poblado", "Manila", 6.2085, -75.5686),
    ("El Poblado", "Castropol", 6.2160, -75.5760),
    ("Belén", "Fátima", 6.2180, -75.6010),
    ("Aranjuez", "Moravia", 6.2770, -75.5650),
    ("Robledo", "Robledo", 6.2790, -75.5950),
];

const CLASES: &[&str] = &["Choque", "Atropello", "Caída de ocupante", "Volcamiento", "Otro"];
const GRAVEDADES: &[&str] = &["Solo daños", "Con heridos", "Con muertos"];
const YEARS: &[&str] = &["2017", "2018", "2019", "2020"];

fn main() -> Result<()> {
    let mut rng = SplitMix(2019);
    let output_path = "sample_accidents.csv";
    let mut writer = csv::Writer::from_path(output_path).context("creating output file")?;

    writer.write_record([
        "RADICADO",
        "AÑO",
        "CLASE_ACCIDENTE",
        "GRAVEDAD_ACCIDENTE",
        "BARRIO",
        "COMUNA",
        "LOCATION",
    ])?;

    let n_rows = 2500;
    let mut broken = 0;
    for id in 0..n_rows {
        let (comuna, barrio, lat0, lon0) =
            NEIGHBORHOODS[rng.below(NEIGHBORHOODS.len())];
        let lat = rng.around(lat0, 0.004);
        let lon = rng.around(lon0, 0.004);

        // Roughly 3% of rows carry the kinds of defects seen in real exports.
        let (location, ok) = match rng.below(100) {
            0 => (String::new(), false),
            1 => (format!("[{lat:.6}, {lon:.6}]"), false),
            2 => (format!("[{lon:.6}; {lat:.6}]"), false),
            _ => (format!("[{lon:.6}, {lat:.6}]"), true),
        };
        if !ok {
            broken += 1;
        }

        writer.write_record([
            (100_000 + id).to_string(),
            rng.pick(YEARS).to_string(),
            rng.pick(CLASES).to_string(),
            rng.pick(GRAVEDADES).to_string(),
            barrio.to_string(),
            comuna.to_string(),
            location,
        ])?;
    }
    writer.flush()?;

    println!("Wrote {n_rows} accidents ({broken} with broken locations) to {output_path}");
    Ok(())
}
