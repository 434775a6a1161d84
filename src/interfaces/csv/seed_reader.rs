use crate::domain::address::Address;
use crate::domain::item::Item;
use crate::domain::money::{Amount, Currency};
use crate::domain::{AddressId, ItemId, UserId};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct ItemRecord {
    id: ItemId,
    seller: UserId,
    title: String,
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
    #[serde(default)]
    currency: Option<Currency>,
}

#[derive(Debug, Deserialize)]
struct AddressRecord {
    id: AddressId,
    owner: UserId,
    line1: String,
    #[serde(default)]
    line2: Option<String>,
    city: String,
    #[serde(default)]
    emirate: Option<String>,
    #[serde(default)]
    postal_code: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl TryFrom<ItemRecord> for Item {
    type Error = LedgerError;

    fn try_from(record: ItemRecord) -> Result<Self> {
        let price = Amount::positive(record.price)?;
        Ok(Item::new(
            record.id,
            record.seller,
            record.title,
            price,
            record.currency.unwrap_or_default(),
        ))
    }
}

impl From<AddressRecord> for Address {
    fn from(record: AddressRecord) -> Self {
        Address {
            id: record.id,
            owner_id: record.owner,
            line1: record.line1,
            line2: record.line2,
            city: record.city,
            emirate: record.emirate,
            postal_code: record.postal_code,
            country: record.country.unwrap_or_else(|| "AE".to_string()),
        }
    }
}

/// Reads catalog listings or shipping addresses used to seed a store.
///
/// Items: `id,seller,title,price,currency`. Addresses:
/// `id,owner,line1,line2,city,emirate,postal_code,country`.
pub struct SeedReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> SeedReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn items(self) -> impl Iterator<Item = Result<Item>> {
        self.reader
            .into_deserialize::<ItemRecord>()
            .map(|result| result.map_err(LedgerError::from).and_then(Item::try_from))
    }

    pub fn addresses(self) -> impl Iterator<Item = Result<Address>> {
        self.reader
            .into_deserialize::<AddressRecord>()
            .map(|result| result.map(Address::from).map_err(LedgerError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::ItemStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn test_items_default_to_aed_and_available() {
        let data = "id,seller,title,price,currency\n\
                    22222222-2222-2222-2222-222222222222,55555555-5555-5555-5555-555555555555,Oud,100.00,\n\
                    66666666-6666-6666-6666-666666666666,55555555-5555-5555-5555-555555555555,Lamp,40,USD\n";
        let items: Vec<Item> = SeedReader::new(data.as_bytes())
            .items()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].currency, Currency::Aed);
        assert_eq!(items[0].price.value(), dec!(100.00));
        assert_eq!(items[0].status, ItemStatus::Available);
        assert_eq!(items[1].currency, Currency::Usd);
    }

    #[test]
    fn test_item_price_is_read_exactly() {
        let data = "id,seller,title,price\n\
                    22222222-2222-2222-2222-222222222222,55555555-5555-5555-5555-555555555555,Oud,12345678901234567.89\n";
        let item = SeedReader::new(data.as_bytes())
            .items()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(item.price.value(), dec!(12345678901234567.89));
        assert_eq!(item.price.to_string(), "12345678901234567.89");
    }

    #[test]
    fn test_item_price_must_be_positive() {
        let data = "id,seller,title,price\n\
                    22222222-2222-2222-2222-222222222222,55555555-5555-5555-5555-555555555555,Oud,0\n";
        let mut items = SeedReader::new(data.as_bytes()).items();
        assert!(matches!(
            items.next().unwrap(),
            Err(LedgerError::ValidationError(_))
        ));
    }

    #[test]
    fn test_addresses_with_optional_columns() {
        let data = "id,owner,line1,line2,city,emirate,postal_code,country\n\
                    33333333-3333-3333-3333-333333333333,11111111-1111-1111-1111-111111111111,Marina Walk,,Dubai,Dubai,,\n";
        let addresses: Vec<Address> = SeedReader::new(data.as_bytes())
            .addresses()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(addresses[0].line2, None);
        assert_eq!(addresses[0].emirate.as_deref(), Some("Dubai"));
        assert_eq!(addresses[0].country, "AE");
    }
}
