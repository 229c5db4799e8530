use anyhow::{Context, Result};

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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_f64() * items.len() as f64) as usize % items.len()]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

const CUISINES: [&str; 8] = [
    "Italian", "Mexican", "Indian", "Thai", "Japanese", "American", "Mediterranean", "French",
];
const DIETS: [&str; 5] = ["Vegan", "Vegetarian", "Keto", "Paleo", "Balanced"];
const METHODS: [&str; 6] = ["Grilled", "Baked", "Fried", "Steamed", "Raw", "Roasted"];
const MEAL_TYPES: [&str; 4] = ["Breakfast", "Lunch", "Dinner", "Snack"];
const DISHES: [&str; 10] = [
    "Bowl", "Salad", "Curry", "Wrap", "Stew", "Pasta", "Tacos", "Soup", "Stir Fry", "Sandwich",
];

const HEADER: [&str; 20] = [
    "meal_id",
    "meal_name",
    "cuisine",
    "meal_type",
    "diet_type",
    "calories",
    "protein_g",
    "carbs_g",
    "fat_g",
    "fiber_g",
    "sugar_g",
    "sodium_mg",
    "cholesterol_mg",
    "serving_size_g",
    "cooking_method",
    "prep_time_min",
    "cook_time_min",
    "rating",
    "health_score",
    "is_healthy",
];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let n_meals = 2_000;

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "healthy_eating_dataset_clean.csv".to_string());
    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record(HEADER)?;

    for id in 1..=n_meals {
        let cuisine = rng.pick(&CUISINES);
        let diet = rng.pick(&DIETS);
        let method = rng.pick(&METHODS);
        let meal_type = rng.pick(&MEAL_TYPES);
        let name = format!("{cuisine} {diet} {}", rng.pick(&DISHES));

        let fried = if method == "Fried" { 250.0 } else { 0.0 };
        let calories = (rng.gauss(550.0, 180.0) + fried).clamp(80.0, 1600.0);
        let protein = rng.gauss(calories * 0.05, 6.0).max(0.0);
        let carbs = rng.gauss(calories * 0.11, 12.0).max(0.0);
        let fat = rng.gauss(calories * 0.035, 5.0).max(0.0);
        let fiber = rng.gauss(if diet == "Vegan" { 11.0 } else { 6.0 }, 3.0).max(0.0);
        let sugar = rng.gauss(14.0, 7.0).max(0.0);
        let sodium = rng.gauss(800.0, 300.0).max(20.0);
        let cholesterol = if diet == "Vegan" { 0.0 } else { rng.gauss(70.0, 30.0).max(0.0) };

        let health_score = (100.0 - calories / 20.0 + fiber * 1.5 - sugar * 0.6 - sodium / 100.0
            + rng.gauss(0.0, 6.0))
        .clamp(0.0, 100.0);
        let is_healthy = u8::from(health_score >= 60.0);

        // Sprinkle a few gaps so the dashboard's missing-value handling shows.
        let calories_field = if rng.chance(0.01) {
            String::new()
        } else {
            format!("{calories:.1}")
        };
        let health_field = if rng.chance(0.01) {
            String::new()
        } else {
            format!("{health_score:.1}")
        };

        writer.write_record([
            id.to_string(),
            name,
            cuisine.to_string(),
            meal_type.to_string(),
            diet.to_string(),
            calories_field,
            format!("{protein:.1}"),
            format!("{carbs:.1}"),
            format!("{fat:.1}"),
            format!("{fiber:.1}"),
            format!("{sugar:.1}"),
            format!("{sodium:.0}"),
            format!("{cholesterol:.0}"),
            format!("{:.0}", rng.gauss(350.0, 80.0).max(80.0)),
            method.to_string(),
            format!("{:.0}", rng.gauss(15.0, 6.0).max(2.0)),
            format!("{:.0}", rng.gauss(25.0, 12.0).max(0.0)),
            format!("{:.1}", rng.gauss(3.8, 0.6).clamp(1.0, 5.0)),
            health_field,
            is_healthy.to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;

    println!("Wrote {n_meals} meals to {output_path}");
    Ok(())
}
