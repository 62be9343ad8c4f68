//! Ordered operator table with index-based modulator links.
//!
//! Operator 0 is the carrier. A modulator must sit at a higher index than the
//! operator it modulates and may drive only one operator, so every chain is a
//! tree and evaluation always terminates. Both rules are checked when the chain
//! is built; nothing is checked per sample.

use super::error::SynthError;
use super::operator::{Operator, OperatorConfig};

pub struct OperatorChain {
    operators: Vec<Operator>,
}

impl OperatorChain {
    pub fn new(operators: Vec<Operator>) -> Result<Self, SynthError> {
        let links: Vec<Option<usize>> = operators.iter().map(Operator::modulator).collect();
        validate_links(&links)?;
        Ok(Self { operators })
    }

    pub fn from_configs(
        configs: &[OperatorConfig],
        sample_rate: f32,
        max_voices: usize,
    ) -> Result<Self, SynthError> {
        let operators = configs
            .iter()
            .cloned()
            .map(|config| Operator::new(config, sample_rate, max_voices))
            .collect();
        Self::new(operators)
    }

    /// A chain with no operators. Renders silence.
    pub fn empty() -> Self {
        Self {
            operators: Vec::new(),
        }
    }

    /// Attaches (or detaches, with `None`) the modulator of `operator`.
    pub fn connect(&mut self, operator: usize, modulator: Option<usize>) -> Result<(), SynthError> {
        let mut links: Vec<Option<usize>> = self.operators.iter().map(Operator::modulator).collect();
        let len = links.len();
        let slot = links.get_mut(operator).ok_or(SynthError::UnknownModulator {
            operator,
            modulator: operator,
            len,
        })?;
        *slot = modulator;
        validate_links(&links)?;
        self.operators[operator].set_modulator(modulator);
        Ok(())
    }

    /// Next sample of the operator at `index`, pulling its modulator chain first.
    pub fn frequency_sample_value(&mut self, index: usize, note_on: bool, dt: f32) -> f32 {
        let modulator = match self.operators.get(index) {
            Some(operator) => operator.modulator(),
            None => return 0.0,
        };
        let modulation = modulator.map(|m| self.frequency_sample_value(m, note_on, dt));
        self.operators[index].frequency_sample_value(note_on, dt, modulation)
    }

    pub fn carrier(&self) -> Option<&Operator> {
        self.operators.first()
    }

    pub fn get(&self, index: usize) -> Option<&Operator> {
        self.operators.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Operator> {
        self.operators.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operator> {
        self.operators.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Operator> {
        self.operators.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

fn validate_links(links: &[Option<usize>]) -> Result<(), SynthError> {
    let len = links.len();
    let mut driven_by: Vec<Option<usize>> = vec![None; len];
    for (operator, link) in links.iter().enumerate() {
        let Some(modulator) = *link else {
            continue;
        };
        if modulator >= len {
            return Err(SynthError::UnknownModulator {
                operator,
                modulator,
                len,
            });
        }
        if modulator <= operator {
            return Err(SynthError::ModulatorOrder {
                operator,
                modulator,
            });
        }
        if let Some(first) = driven_by[modulator] {
            return Err(SynthError::SharedModulator {
                modulator,
                first,
                second: operator,
            });
        }
        driven_by[modulator] = Some(operator);
    }
    Ok(())
}
