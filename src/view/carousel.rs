// Carousel controller.
// Circular active index over a fixed set of cards.

/// Where a card sits relative to the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPosition {
    Active,
    NearLeft,
    FarLeft,
    NearRight,
    FarRight,
    Hidden,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Carousel {
    len: usize,
    current: usize,
}

impl Carousel {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Active index, or `None` when there are no cards.
    pub fn current(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.current)
    }

    pub fn next(&mut self) {
        if self.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.len;
    }

    pub fn previous(&mut self) {
        if self.is_empty() {
            return;
        }
        self.current = (self.current + self.len - 1) % self.len;
    }

    /// Activate `index`. Returns false if it is already active or out of range.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.len || index == self.current {
            return false;
        }
        self.current = index;
        true
    }

    /// Bucket a card by its circular distance from the active card.
    pub fn position_of(&self, index: usize) -> CardPosition {
        if index >= self.len {
            return CardPosition::Hidden;
        }
        let offset = (index + self.len - self.current) % self.len;
        if offset == 0 {
            CardPosition::Active
        } else if offset == 1 {
            CardPosition::NearRight
        } else if offset == 2 {
            CardPosition::FarRight
        } else if offset == self.len - 1 {
            CardPosition::NearLeft
        } else if offset == self.len - 2 {
            CardPosition::FarLeft
        } else {
            CardPosition::Hidden
        }
    }

    /// Indices in left-to-right display order, hidden cards omitted.
    pub fn display_order(&self) -> Vec<(usize, CardPosition)> {
        let rank = |position: CardPosition| match position {
            CardPosition::FarLeft => 0,
            CardPosition::NearLeft => 1,
            CardPosition::Active => 2,
            CardPosition::NearRight => 3,
            CardPosition::FarRight => 4,
            CardPosition::Hidden => 5,
        };
        let mut order: Vec<(usize, CardPosition)> = (0..self.len)
            .map(|index| (index, self.position_of(index)))
            .filter(|(_, position)| *position != CardPosition::Hidden)
            .collect();
        order.sort_by_key(|(_, position)| rank(*position));
        order
    }
}
