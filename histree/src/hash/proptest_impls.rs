use super::Digest;

use proptest::{arbitrary::StrategyFor, prelude::*, strategy::Map};

impl Arbitrary for Digest {
    type Parameters = ();
    type Strategy = Map<StrategyFor<[u8; 32]>, fn([u8; 32]) -> Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        any::<[u8; 32]>().prop_map(Digest as fn([u8; 32]) -> Self)
    }
}
