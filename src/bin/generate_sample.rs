use std::path::PathBuf;

use byteorder::{LittleEndian, WriteBytesExt};

use csprobe::data::loader::save_file;
use csprobe::data::model::{Schema, StructuredArray};

const DESCR: &str = "[('uid', '<u8'), ('blob/path', '|S32'), ('blob/idx', '<u4'), \
    ('blob/shape', '<u4', (2,)), ('ctf/df1_A', '<f4'), ('ctf/df2_A', '<f4'), \
    ('alignments3D/pose_ess', '<f4'), ('alignments3D/shift', '<f4', (2,)), \
    ('alignments3D/error', '<f4'), ('alignments3D/psize_A', '<f4')]";

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

fn main() {
    let output_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_particles.cs"));
    let n_micrographs = 8;
    let per_micrograph = 250;

    let schema = Schema::parse(DESCR).expect("sample descr is valid");
    let mut rng = SimpleRng::new(42);
    let mut data = Vec::with_capacity(n_micrographs * per_micrograph * schema.itemsize());

    let mut uid = 1_000_000u64;
    for mic in 0..n_micrographs {
        // defocus is shared by particles of one micrograph, with small astigmatism
        let defocus = rng.gauss(15_000.0, 3_000.0);
        let mut path = format!("J1/imported/mic_{mic:04}.mrcs").into_bytes();
        path.resize(32, 0);

        for idx in 0..per_micrograph {
            let ess = if rng.next_f64() < 0.01 {
                f32::NAN
            } else {
                rng.gauss(3.0, 0.6).max(1.0) as f32
            };

            data.write_u64::<LittleEndian>(uid).expect("write to Vec");
            data.extend_from_slice(&path);
            data.write_u32::<LittleEndian>(idx as u32).expect("write to Vec");
            for dim in [256u32, 256] {
                data.write_u32::<LittleEndian>(dim).expect("write to Vec");
            }
            data.write_f32::<LittleEndian>(defocus as f32).expect("write to Vec");
            data.write_f32::<LittleEndian>(rng.gauss(defocus, 150.0) as f32)
                .expect("write to Vec");
            data.write_f32::<LittleEndian>(ess).expect("write to Vec");
            for _ in 0..2 {
                data.write_f32::<LittleEndian>(rng.gauss(0.0, 2.5) as f32)
                    .expect("write to Vec");
            }
            data.write_f32::<LittleEndian>(rng.gauss(42_000.0, 900.0) as f32)
                .expect("write to Vec");
            data.write_f32::<LittleEndian>(1.06).expect("write to Vec");
            uid += 1;
        }
    }

    let rows = n_micrographs * per_micrograph;
    let array = StructuredArray::new(schema, rows, data).expect("row bytes match schema");
    save_file(&output_path, &array).expect("Failed to write sample file");

    println!(
        "Wrote {rows} particles ({} columns) to {}",
        array.schema().fields().len(),
        output_path.display()
    );
}
