use std::collections::{BTreeSet, HashSet};

use alloy_primitives::Address;

use crate::{
    document::{address_id, AddressDocument, AddressKind, IndexKind},
    store::{IndexStore, StoreError},
};

/// Addresses referenced while building one block, split by how they were seen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressReferences {
    addresses: BTreeSet<Address>,
    contracts: BTreeSet<Address>,
}

impl AddressReferences {
    pub fn record(&mut self, from: Address, to: Option<Address>, contract: Option<Address>) {
        self.add_address(from);
        if let Some(to) = to {
            self.add_address(to);
        }
        if let Some(contract) = contract {
            self.add_contract(contract);
        }
    }

    pub fn add_address(&mut self, address: Address) {
        if !address.is_zero() {
            self.addresses.insert(address);
        }
    }

    pub fn add_contract(&mut self, address: Address) {
        if !address.is_zero() {
            self.contracts.insert(address);
        }
    }

    pub fn addresses(&self) -> &BTreeSet<Address> {
        &self.addresses
    }

    pub fn contracts(&self) -> &BTreeSet<Address> {
        &self.contracts
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.contracts.is_empty()
    }

    /// Every referenced address once, contracts winning over externally-owned.
    pub fn candidates(&self) -> Vec<AddressDocument> {
        let contracts = self
            .contracts
            .iter()
            .map(|address| AddressDocument::new(address, AddressKind::Contract));
        let accounts = self
            .addresses
            .difference(&self.contracts)
            .map(|address| AddressDocument::new(address, AddressKind::ExternallyOwned));
        contracts.chain(accounts).collect()
    }

    /// Drops candidates whose ID is already indexed.
    pub fn classify(&self, existing: &HashSet<String>) -> Vec<AddressDocument> {
        self.candidates()
            .into_iter()
            .filter(|doc| !existing.contains(&doc.address))
            .collect()
    }
}

pub struct AddressDeduplicator<'a, S> {
    store: &'a S,
}

impl<'a, S: IndexStore> AddressDeduplicator<'a, S> {
    pub fn new(store: &'a S) -> AddressDeduplicator<'a, S> {
        AddressDeduplicator { store }
    }

    /// One existence lookup for the whole block, then the documents still to write.
    pub async fn resolve(
        &self,
        references: &AddressReferences,
    ) -> Result<Vec<AddressDocument>, StoreError> {
        if references.is_empty() {
            return Ok(vec![]);
        }

        let ids = references
            .addresses
            .iter()
            .chain(references.contracts.iter())
            .map(address_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let existing = self.store.find_existing_ids(IndexKind::Address, &ids).await?;
        tracing::debug!(
            "{} of {} referenced addresses already indexed",
            existing.len(),
            ids.len()
        );

        Ok(references.classify(&existing))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    const A: Address = address!("000000000000000000000000000000000000000a");
    const B: Address = address!("000000000000000000000000000000000000000b");
    const C: Address = address!("000000000000000000000000000000000000000c");

    #[test]
    fn test_existing_addresses_are_skipped() {
        let mut refs = AddressReferences::default();
        refs.record(A, Some(B), None);
        refs.record(C, None, None);

        let existing = HashSet::from([address_id(&A)]);
        let docs = refs.classify(&existing);

        assert_eq!(
            docs,
            vec![
                AddressDocument::new(&B, AddressKind::ExternallyOwned),
                AddressDocument::new(&C, AddressKind::ExternallyOwned),
            ]
        );
    }

    #[test]
    fn test_contract_wins_over_account() {
        let mut refs = AddressReferences::default();
        refs.record(A, Some(B), Some(C));
        refs.record(A, Some(C), None);

        let docs = refs.classify(&HashSet::new());

        assert_eq!(docs.len(), 3);
        assert!(docs.contains(&AddressDocument::new(&C, AddressKind::Contract)));
        assert!(!docs.contains(&AddressDocument::new(&C, AddressKind::ExternallyOwned)));
    }

    #[test]
    fn test_zero_address_never_recorded() {
        let mut refs = AddressReferences::default();
        refs.record(Address::ZERO, Some(Address::ZERO), Some(Address::ZERO));
        assert!(refs.is_empty());
        assert!(refs.candidates().is_empty());
    }
}
