//! Core types shared by the game and the controller.

use rand_core::RngCore;

/// One of the two physical buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Side {
    Left,
    Right,
}

/// A captured press in game mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Symbol {
    /// Left button, written `L`.
    Left,
    /// Right button, written `R`.
    Right,
}

impl Symbol {
    /// Returns the pattern character for this symbol.
    #[inline]
    pub fn as_char(self) -> char {
        match self {
            Symbol::Left => 'L',
            Symbol::Right => 'R',
        }
    }

    /// Parses a pattern character.
    #[inline]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'L' => Some(Symbol::Left),
            'R' => Some(Symbol::Right),
            _ => None,
        }
    }
}

impl From<Side> for Symbol {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Symbol::Left,
            Side::Right => Symbol::Right,
        }
    }
}

/// How a sound effect is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoundChoice {
    /// Always the same file.
    Fixed(&'static str),

    /// Uniformly chosen from a set on every use.
    ///
    /// An empty set picks nothing.
    Random(&'static [&'static str]),
}

impl SoundChoice {
    /// Picks a file name.
    pub fn pick<R: RngCore>(&self, rng: &mut R) -> Option<&'static str> {
        match *self {
            SoundChoice::Fixed(name) => Some(name),
            SoundChoice::Random(set) if set.is_empty() => None,
            SoundChoice::Random(set) => {
                let index = rng.next_u32() as usize % set.len();
                Some(set[index])
            }
        }
    }
}
