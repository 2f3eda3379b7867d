use rand::Rng;

use crate::{Grid, MapError, Result, Settings, progress::GenerationProgress};

/// Restart policy around [`Grid::generate`].
///
/// A contradiction ends the attempt; the next one starts again from the
/// template grid and keeps drawing from the same random source.
#[derive(Clone, Debug)]
pub struct Generator {
    width: usize,
    height: usize,
    max_attempts: usize,
    progress: bool,
}

impl Generator {
    /// Single-attempt generator for a `width` by `height` grid.
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            max_attempts: 1,
            progress: false,
        }
    }

    /// Generator using the dimensions and attempt limit from `settings`.
    #[must_use]
    pub const fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.width, settings.height).with_max_attempts(settings.max_attempts)
    }

    /// Sets how many fresh grids to try; zero is treated as one.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        self
    }

    /// Shows a terminal progress bar while generating.
    #[must_use]
    pub const fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Maximum number of attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Produces a resolved grid.
    ///
    /// # Errors
    ///
    /// [`MapError::AttemptsExhausted`] when every attempt contradicted.
    pub fn generate(&self, rng: &mut impl Rng) -> Result<Grid> {
        self.generate_from(&Grid::new(self.width, self.height), rng)
    }

    /// Resolves a copy of `template`, whose cells may already be narrowed or collapsed.
    ///
    /// Every attempt restarts from the template; its dimensions override the generator's.
    ///
    /// # Errors
    ///
    /// [`MapError::AttemptsExhausted`] when every attempt contradicted.
    pub fn generate_from(&self, template: &Grid, rng: &mut impl Rng) -> Result<Grid> {
        self.resolve(template, rng).map(|(grid, _)| grid)
    }

    /// Resolved grid and the attempt that produced it.
    fn resolve(&self, template: &Grid, rng: &mut impl Rng) -> Result<(Grid, usize)> {
        let cells = template.width() * template.height();
        let mut progress = GenerationProgress::new(cells, self.progress);
        let mut attempt = 1;

        loop {
            let mut grid = template.clone();
            match Self::run(&mut grid, rng, &progress) {
                Ok(()) => {
                    tracing::debug!(
                        attempt,
                        restarts = progress.restart_count(),
                        steps = grid.steps(),
                        "generated map"
                    );
                    progress.finish();
                    return Ok((grid, attempt));
                }
                Err(err) if err.is_contradiction() && attempt < self.max_attempts => {
                    tracing::warn!(attempt, steps = grid.steps(), "{err}");
                    progress.record_restart();
                    attempt += 1;
                }
                Err(err) if err.is_contradiction() => {
                    tracing::warn!(attempt, steps = grid.steps(), "{err}");
                    progress.finish();
                    return Err(MapError::AttemptsExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    progress.finish();
                    return Err(err);
                }
            }
        }
    }

    fn run(grid: &mut Grid, rng: &mut impl Rng, progress: &GenerationProgress) -> Result<()> {
        while grid.step(rng)?.is_some() {
            progress.increment();
        }
        Ok(())
    }
}
