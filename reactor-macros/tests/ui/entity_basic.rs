use reactor_core::entity::Entity;
use reactor_macros::entity;

#[entity(id = u64)]
struct Pet {
    name: String,
}

#[entity]
#[derive(PartialEq)]
struct Note {
    body: Option<String>,
}

fn main() {
    let pet = Pet {
        id: 7,
        name: "Rex".to_string(),
    };
    assert_eq!(Pet::TYPE, "Pet");
    assert_eq!(*pet.id(), 7);
    assert_eq!(pet.read("name"), Some(serde_json::json!("Rex")));
    let _ = format!("{:?}", pet.clone());

    let note = Note {
        id: "n-1".to_string(),
        body: None,
    };
    assert_eq!(note.id(), "n-1");
    assert!(note.read("body").is_none());
    assert_eq!(note.clone(), note);
}
