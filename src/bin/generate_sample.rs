use std::fmt::Write as _;
use std::path::PathBuf;

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

const SAMPLES: usize = 64;
const LINES: usize = 48;
/// Dark reference band first, then visible and NIR bands.
const WAVELENGTHS: [f64; 7] = [0.0, 450.0, 520.0, 590.0, 660.0, 730.0, 850.0];

/// Leaf-like reflectance: green bump plus the red edge towards NIR.
fn reflectance(nm: f64) -> f64 {
    if nm == 0.0 {
        return 0.0;
    }
    let green = gaussian(nm, 550.0, 35.0, 0.15);
    let red_edge = 0.5 / (1.0 + (-(nm - 710.0) / 15.0).exp());
    0.05 + green + red_edge
}

fn main() -> std::io::Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    let mut rng = SimpleRng::new(42);

    // BSQ, u16 little endian
    let mut data: Vec<u8> = Vec::with_capacity(SAMPLES * LINES * WAVELENGTHS.len() * 2);
    for &nm in &WAVELENGTHS {
        for row in 0..LINES {
            for col in 0..SAMPLES {
                // Illumination falls off towards the image corners.
                let dx = col as f64 / SAMPLES as f64 - 0.5;
                let dy = row as f64 / LINES as f64 - 0.5;
                let illumination = 1.0 - 0.6 * (dx * dx + dy * dy);

                let signal = if nm == 0.0 {
                    rng.gauss(180.0, 12.0)
                } else {
                    reflectance(nm) * illumination * 4000.0 + rng.gauss(0.0, 40.0)
                };
                let value = signal.round().clamp(0.0, u16::MAX as f64) as u16;
                data.extend_from_slice(&value.to_le_bytes());
            }
        }
    }

    let mut header = String::from("ENVI\n");
    header.push_str("description = {synthetic multispectral cube}\n");
    let _ = writeln!(header, "samples = {SAMPLES}");
    let _ = writeln!(header, "lines = {LINES}");
    let _ = writeln!(header, "bands = {}", WAVELENGTHS.len());
    header.push_str("header offset = 0\n");
    header.push_str("file type = ENVI Standard\n");
    header.push_str("data type = 12\n");
    header.push_str("interleave = bsq\n");
    header.push_str("byte order = 0\n");
    header.push_str("wavelength units = nm\n");
    let labels: Vec<String> = WAVELENGTHS.iter().map(|wl| format!("{wl:.1}")).collect();
    let _ = writeln!(header, "wavelength = {{ {} }}", labels.join(", "));

    let data_path = out_dir.join("sample_cube");
    let header_path = out_dir.join("sample_cube.hdr");
    std::fs::write(&data_path, &data)?;
    std::fs::write(&header_path, header)?;

    println!(
        "Wrote {}x{} cube with {} bands to {} (+ .hdr)",
        SAMPLES,
        LINES,
        WAVELENGTHS.len(),
        data_path.display()
    );
    Ok(())
}
