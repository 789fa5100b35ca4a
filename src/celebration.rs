use rand::seq::SliceRandom;
use rand::Rng;

/// How long the arrival animation plays, in seconds
pub const CELEBRATION_SECS: f64 = 3.0;
const BANNER: &str = "ARRIVED!";
const SPARKS: [char; 6] = ['✈', '✦', '*', '+', '·', '°'];
const GRAVITY: f64 = 12.0;

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    /// Letters of the banner fly to a fixed slot and stay there
    pub target: Option<(f64, f64)>,
}

impl Particle {
    fn spark<R: Rng + ?Sized>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *SPARKS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(1.5..CELEBRATION_SECS),
            target: None,
        }
    }

    fn letter(from: (f64, f64), to: (f64, f64), symbol: char, color_index: usize) -> Self {
        Self {
            x: from.0,
            y: from.1,
            vel_x: to.0 - from.0,
            vel_y: to.1 - from.1,
            symbol,
            color_index,
            age: 0.0,
            max_age: CELEBRATION_SECS,
            target: Some(to),
        }
    }

    pub fn is_letter(&self) -> bool {
        self.target.is_some()
    }

    /// Advance by `dt` seconds; false once the particle has burnt out
    fn update(&mut self, dt: f64) -> bool {
        match self.target {
            Some((tx, ty)) => {
                let dist = ((tx - self.x).powi(2) + (ty - self.y).powi(2)).sqrt();
                if dist > 0.5 {
                    self.x += self.vel_x * dt * 2.0;
                    self.y += self.vel_y * dt * 2.0;
                    self.vel_x = tx - self.x;
                    self.vel_y = ty - self.y;
                } else {
                    self.x = tx;
                    self.y = ty;
                }
            }
            None => {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_y += GRAVITY * dt;
            }
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// Burst of sparks with an "ARRIVED!" banner, shown when a flight lands
#[derive(Debug, Default)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    elapsed: f64,
    active: bool,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<R: Rng + ?Sized>(&mut self, width: u16, height: u16, rng: &mut R) {
        self.particles.clear();
        self.elapsed = 0.0;
        self.active = true;
        self.width = width as f64;
        self.height = height as f64;

        let cx = self.width / 2.0;
        let cy = self.height / 2.0;

        let spacing = 2.0;
        let left = cx - (BANNER.chars().count() as f64 - 1.0) * spacing / 2.0;
        for (i, ch) in BANNER.chars().enumerate() {
            let from = (cx + rng.gen_range(-10.0..10.0), cy + rng.gen_range(-5.0..5.0));
            let to = (left + i as f64 * spacing, cy - 2.0);
            self.particles
                .push(Particle::letter(from, to, ch, rng.gen_range(0..7)));
        }

        for _ in 0..24 {
            let x = cx + rng.gen_range(-15.0..15.0);
            let y = cy + rng.gen_range(-6.0..6.0);
            self.particles.push(Particle::spark(x, y, rng));
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.particles.clear();
    }

    /// Advance the animation by `dt` seconds
    pub fn update(&mut self, dt: f64) {
        if !self.active {
            return;
        }

        self.elapsed += dt;
        if self.elapsed >= CELEBRATION_SECS {
            self.stop();
            return;
        }

        let (w, h) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            let alive = p.update(dt);
            let margin = 5.0;
            let gone = !p.is_letter() && (p.y > h + margin || p.x < -margin || p.x > w + margin);
            alive && !gone
        });
    }
}
