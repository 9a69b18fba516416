use reactor_core::entity::Entity;
use reactor_macros::entity;
use uuid::Uuid;

#[entity(type = "Billing::Invoice", debug = false)]
struct Invoice {
    total: u32,
    id: Uuid,
}

impl std::fmt::Debug for Invoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invoice(..)")
    }
}

fn main() {
    let invoice = Invoice {
        id: Uuid::new_v4(),
        total: 10,
    };
    assert_eq!(Invoice::TYPE, "Billing::Invoice");
    let parsed: Uuid = invoice.id().to_string().parse().unwrap();
    assert_eq!(&parsed, invoice.id());
    assert_eq!(format!("{:?}", invoice), "Invoice(..)");
}
