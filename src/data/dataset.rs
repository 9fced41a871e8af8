use crate::data::encoder::{EntityKind, IdEncoder};
use crate::error::Result;
use crate::models::{Interaction, RatingRecord};
use crate::utils::validation::validate_rating_record;

/// Ratings decoded into dense (user, item, rating) triples together with the
/// encoders that produced the indices.
#[derive(Debug, Clone)]
pub struct InteractionDataset {
    users: IdEncoder,
    items: IdEncoder,
    interactions: Vec<Interaction>,
}

impl InteractionDataset {
    pub fn from_records(records: &[RatingRecord]) -> Result<Self> {
        for record in records {
            validate_rating_record(record)?;
        }

        let users = IdEncoder::fit(EntityKind::User, records.iter().map(|r| r.user_id));
        let items = IdEncoder::fit(EntityKind::Item, records.iter().map(|r| r.item_id));

        let interactions = records
            .iter()
            .map(|record| {
                Ok(Interaction {
                    user: users.encode(record.user_id)?,
                    item: items.encode(record.item_id)?,
                    rating: record.rating,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            users,
            items,
            interactions,
        })
    }

    pub fn users(&self) -> &IdEncoder {
        &self.users
    }

    pub fn items(&self) -> &IdEncoder {
        &self.items
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn num_users(&self) -> usize {
        self.users.size()
    }

    pub fn num_items(&self) -> usize {
        self.items.size()
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Releases the encoders once the model has been trained.
    pub fn into_encoders(self) -> (IdEncoder, IdEncoder) {
        (self.users, self.items)
    }

    /// Interactions grouped by user index: `(item, rating)` per row.
    pub fn by_user(&self) -> Vec<Vec<(usize, f32)>> {
        let mut rows = vec![Vec::new(); self.num_users()];
        for interaction in &self.interactions {
            rows[interaction.user].push((interaction.item, interaction.rating));
        }
        rows
    }

    /// Interactions grouped by item index: `(user, rating)` per row.
    pub fn by_item(&self) -> Vec<Vec<(usize, f32)>> {
        let mut rows = vec![Vec::new(); self.num_items()];
        for interaction in &self.interactions {
            rows[interaction.item].push((interaction.user, interaction.rating));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecError;

    #[test]
    fn test_from_records() {
        let records = vec![
            RatingRecord::new(10, 500, 4.0),
            RatingRecord::new(10, 700, 2.0),
            RatingRecord::new(42, 500, 5.0),
        ];
        let dataset = InteractionDataset::from_records(&records).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.num_users(), 2);
        assert_eq!(dataset.num_items(), 2);
        assert_eq!(
            dataset.interactions()[2],
            Interaction {
                user: 1,
                item: 0,
                rating: 5.0
            }
        );

        let by_item = dataset.by_item();
        assert_eq!(by_item[0], vec![(0, 4.0), (1, 5.0)]);
        assert_eq!(by_item[1], vec![(0, 2.0)]);
    }

    #[test]
    fn test_rejects_non_finite_rating() {
        let records = vec![RatingRecord::new(1, 1, f32::NAN)];
        let result = InteractionDataset::from_records(&records);
        assert!(matches!(result, Err(RecError::InvalidRating { .. })));
    }

    #[test]
    fn test_empty_records() {
        let dataset = InteractionDataset::from_records(&[]).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.num_users(), 0);
    }
}
