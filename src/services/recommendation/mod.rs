use crate::algorithms::{ColdStartPolicy, LatentFactorModel, Strategy};
use crate::data::{EntityKind, IdEncoder};
use crate::error::{RecError, Result};
use crate::models::{RawId, Recommendation, RecommendationResponse};
use crate::utils::top_k_by_score;
use tracing::debug;

/// Serves top-k rankings from a trained model and the encoders it was fitted with.
///
/// Holds no interior mutability: share it behind an `Arc` across any number of
/// concurrent queries.
pub struct RankingService {
    users: IdEncoder,
    items: IdEncoder,
    model: Box<dyn LatentFactorModel>,
    default_k: usize,
}

impl RankingService {
    pub fn new(
        users: IdEncoder,
        items: IdEncoder,
        model: Box<dyn LatentFactorModel>,
        default_k: usize,
    ) -> Result<Self> {
        if users.size() != model.num_users() {
            return Err(RecError::DimensionMismatch {
                kind: EntityKind::User,
                encoder: users.size(),
                model: model.num_users(),
            });
        }
        if items.size() != model.num_items() {
            return Err(RecError::DimensionMismatch {
                kind: EntityKind::Item,
                encoder: items.size(),
                model: model.num_items(),
            });
        }
        if default_k == 0 {
            return Err(RecError::InvalidK(0));
        }

        Ok(Self {
            users,
            items,
            model,
            default_k,
        })
    }

    /// Top `k` items for `user_id`, best first, ties broken by ascending item id.
    ///
    /// Unknown users follow the model's cold-start policy: an empty list for
    /// [`ColdStartPolicy::Drop`], [`RecError::UnknownId`] for
    /// [`ColdStartPolicy::Error`].
    pub fn recommend(&self, user_id: RawId, k: usize) -> Result<Vec<Recommendation>> {
        if k == 0 {
            return Err(RecError::InvalidK(0));
        }

        let user = match self.users.encode(user_id) {
            Ok(user) => user,
            Err(err) => {
                return match self.model.cold_start_policy() {
                    ColdStartPolicy::Drop => {
                        debug!("User {} unseen at training time, dropping", user_id);
                        Ok(Vec::new())
                    }
                    ColdStartPolicy::Error => Err(err),
                }
            }
        };

        let scores = self.model.score_items(user);
        let ranked = top_k_by_score(&scores, k, |item| self.items.decode(item));

        Ok(ranked
            .into_iter()
            .map(|item| Recommendation {
                item_id: self.items.decode(item),
                score: scores[item],
            })
            .collect())
    }

    /// [`RankingService::recommend`] with the `k` configured at construction.
    pub fn recommend_default(&self, user_id: RawId) -> Result<Vec<Recommendation>> {
        self.recommend(user_id, self.default_k)
    }

    /// Like [`RankingService::recommend`] but takes a signed `k` as received
    /// from a caller and rejects non-positive values.
    pub fn recommend_checked(&self, user_id: RawId, k: i64) -> Result<RecommendationResponse> {
        let k = usize::try_from(k)
            .ok()
            .filter(|k| *k > 0)
            .ok_or(RecError::InvalidK(k))?;
        let recommendations = self.recommend(user_id, k)?;
        Ok(RecommendationResponse::new(user_id, recommendations))
    }

    pub fn strategy(&self) -> Strategy {
        self.model.strategy()
    }

    pub fn cold_start_policy(&self) -> ColdStartPolicy {
        self.model.cold_start_policy()
    }

    pub fn users(&self) -> &IdEncoder {
        &self.users
    }

    pub fn items(&self) -> &IdEncoder {
        &self.items
    }
}
