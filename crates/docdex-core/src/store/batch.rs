use derive_more::{Deref, IntoIterator};

///
/// Mutation
///

#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    HSet {
        key: String,
        field: String,
        value: String,
    },
    HDel {
        key: String,
        field: String,
    },
    ZAdd {
        key: String,
        score: f64,
        member: String,
    },
    ZRem {
        key: String,
        member: String,
    },
}

impl Mutation {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::HSet { key, .. }
            | Self::HDel { key, .. }
            | Self::ZAdd { key, .. }
            | Self::ZRem { key, .. } => key,
        }
    }
}

///
/// Batch
///
/// Ordered mutations submitted together through `KvStore::exec`; either
/// every mutation applies or none does.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator, PartialEq)]
#[into_iterator(owned, ref)]
pub struct Batch(Vec<Mutation>);

impl Batch {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.0.push(mutation);
    }

    pub fn hset(
        &mut self,
        key: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.push(Mutation::HSet {
            key: key.into(),
            field: field.into(),
            value: value.into(),
        });
    }

    pub fn hdel(&mut self, key: impl Into<String>, field: impl Into<String>) {
        self.push(Mutation::HDel {
            key: key.into(),
            field: field.into(),
        });
    }

    pub fn zadd(&mut self, key: impl Into<String>, score: f64, member: impl Into<String>) {
        self.push(Mutation::ZAdd {
            key: key.into(),
            score,
            member: member.into(),
        });
    }

    pub fn zrem(&mut self, key: impl Into<String>, member: impl Into<String>) {
        self.push(Mutation::ZRem {
            key: key.into(),
            member: member.into(),
        });
    }
}
