use xkbrev::{Loader, ModMask, Modifier, XkbError};

mod fixtures;
use fixtures::*;

fn levels(names: &[&str]) -> Vec<Option<String>> {
    names.iter().map(|n| Some(n.to_string())).collect()
}

#[test]
fn test_us_basic() {
    let mut loader = Loader::open(&fixture_paths()).expect("Failed to open database");
    let model = loader.load(&request("us", None, &[])).expect("Failed to load us");

    assert_eq!(model.symbols, "pc+us+inet(evdev)");
    assert_eq!(model.description.as_deref(), Some("English (US)"));

    let ae01 = model.key("AE01").unwrap();
    assert_eq!(ae01.levels, levels(&["1", "exclam"]));
    assert_eq!(ae01.type_name, "TWO_LEVEL");
    assert_eq!(model.key("AC01").unwrap().type_name, "ALPHABETIC");
    assert_eq!(model.key("KP7").unwrap().type_name, "KEYPAD");
    assert_eq!(model.key("LSGT").unwrap().type_name, "FOUR_LEVEL");
    assert_eq!(model.key("KPDV").unwrap().type_name, "CTRL+ALT");

    // <ALT> and <META> have nothing at the base level
    assert!(model.key("ALT").is_none());
    assert!(model.key("META").is_none());

    // Media keys have no xfree86 keycode but still belong to the layout
    assert!(model.key("MUTE").is_some());
    assert!(model.modifier_map["Mod1"].contains(&"Alt_L".to_string()));
}

#[test]
fn test_every_key_has_a_base_symbol() {
    let requests = [
        request("us", None, &[]),
        request("us", Some("dvorak"), &[]),
        request("us", Some("dvp"), &[]),
        request("us", None, &["ctrl:nocaps"]),
        request("us", None, &["lv3:ralt_switch"]),
        request("us", Some("dvp"), &["ctrl:swapcaps", "caps:swapescape"]),
    ];

    let mut loader = Loader::open(&fixture_paths()).unwrap();
    for request in &requests {
        let model = loader
            .load(request)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", request, e));

        assert!(
            model.unresolved_keys().is_empty(),
            "{}: keys without a base symbol: {:?}",
            request,
            model.unresolved_keys()
        );
        for key in model.keys.values() {
            let key_type = model
                .key_type(key)
                .unwrap_or_else(|| panic!("{}: <{}> has no type", request, key.name));
            assert!(
                key.levels.len() <= key_type.num_levels,
                "{}: <{}> has more levels than {}",
                request,
                key.name,
                key_type.name
            );
        }
    }
}

#[test]
fn test_programmer_dvorak() {
    let mut loader = Loader::open(&fixture_paths()).unwrap();
    let us = loader.load(&request("us", None, &[])).unwrap();
    let dvp = loader.load(&request("us", Some("dvp"), &[])).unwrap();

    assert_eq!(dvp.description.as_deref(), Some("English (programmer Dvorak)"));
    assert_eq!(dvp.key("AE01").unwrap().levels, levels(&["ampersand", "percent"]));
    assert_ne!(us.key("AE01"), dvp.key("AE01"));

    // Inherited from us(dvorak) and left alone by dvp
    assert_eq!(dvp.key("AB02").unwrap().levels, levels(&["q", "Q"]));

    let altgr = ModMask::from(Modifier::LevelThree);
    let caps = ModMask::from(Modifier::Lock);
    let shift = ModMask::from(Modifier::Shift);
    assert_eq!(dvp.key("AE05").unwrap().type_name, "FOUR_LEVEL_ALPHABETIC");
    assert_eq!(dvp.symbol("AE05", altgr), Some("EuroSign"));
    assert_eq!(dvp.symbol("AE05", altgr.with(Modifier::Shift)), None);
    assert_eq!(dvp.symbol("AE02", shift), Some("7"));
    assert_eq!(dvp.symbol("AE02", caps), Some("7"));
    assert_eq!(dvp.symbol("AC01", caps), Some("A"));
    assert_eq!(dvp.symbol("AC01", altgr), Some("aring"));
    assert_eq!(us.symbol("AE05", altgr), Some("5"));

    // level3(ralt_switch) turns right Alt into the AltGr key
    let ralt = dvp.key("RALT").unwrap();
    assert_eq!(ralt.type_name, "ONE_LEVEL");
    assert_eq!(ralt.levels, levels(&["ISO_Level3_Shift"]));
    assert!(dvp.modifier_map["Mod5"].contains(&"<LVL3>".to_string()));
    assert_eq!(us.key("RALT").unwrap().levels, levels(&["Alt_R", "Meta_R"]));
}

#[test]
fn test_options_follow_layout() {
    let mut loader = Loader::open(&fixture_paths()).unwrap();

    let model = loader.load(&request("us", None, &["ctrl:nocaps"])).unwrap();
    assert_eq!(model.symbols, "pc+us+inet(evdev)+ctrl(nocaps)");
    let capslock = model.key("CAPS").unwrap();
    assert_eq!(capslock.levels, levels(&["Control_L"]));
    assert_eq!(capslock.type_name, "ONE_LEVEL");
    assert!(model.modifier_map["Control"].contains(&"<CAPS>".to_string()));

    let model = loader.load(&request("us", None, &["caps:swapescape"])).unwrap();
    assert_eq!(model.key("CAPS").unwrap().levels, levels(&["Escape"]));
    assert_eq!(model.key("ESC").unwrap().levels, levels(&["Caps_Lock"]));
}

#[test]
fn test_unknown_layout() {
    let mut loader = Loader::open(&fixture_paths()).unwrap();
    match loader.load(&request("xx", None, &[])) {
        Err(XkbError::NotFound { kind, name }) => {
            assert_eq!(kind, "symbols");
            assert_eq!(name, "xx");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_unknown_variant() {
    let mut loader = Loader::open(&fixture_paths()).unwrap();
    match loader.load(&request("us", Some("nosuch"), &[])) {
        Err(XkbError::NotFound { kind, name }) => {
            assert_eq!(kind, "section");
            assert_eq!(name, "symbols/us(nosuch)");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_unknown_option() {
    let mut loader = Loader::open(&fixture_paths()).unwrap();
    match loader.load(&request("us", None, &["ctrl:nocaps", "ctrl:nosuch"])) {
        Err(XkbError::NotFound { kind, name }) => {
            assert_eq!(kind, "option");
            assert_eq!(name, "ctrl:nosuch");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_model_from_list() {
    let mut loader = Loader::open(&fixture_paths()).unwrap();

    let mut pc = request("us", Some("dvp"), &[]);
    pc.model = "pc".to_string();
    let model = loader.load(&pc).expect("Failed to load model pc");
    assert_eq!(model.symbols, "pc+us(dvp)+inet(evdev)");

    let mut unknown = request("us", None, &[]);
    unknown.model = "nosuchmodel".to_string();
    match loader.load(&unknown) {
        Err(XkbError::NotFound { kind, name }) => {
            assert_eq!(kind, "model");
            assert_eq!(name, "nosuchmodel");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_ruleset_without_model_list() {
    // Without rules/base.lst any model is accepted
    let db = temp_database(&[
        (
            "rules/base",
            "! model = keycodes\n  * = evdev\n\n! model = types\n  * = basic\n\n! layout = symbols\n  * = %l\n",
        ),
        ("keycodes/evdev", "default xkb_keycodes \"evdev\" {\n  <AE01> = 10;\n};\n"),
        (
            "types/basic",
            "default xkb_types \"basic\" {\n  type \"TWO_LEVEL\" {\n    modifiers = Shift;\n    map[Shift] = Level2;\n  };\n};\n",
        ),
        ("symbols/us", "default xkb_symbols \"basic\" {\n  key <AE01> { [ 1, exclam ] };\n};\n"),
    ]);
    let paths = xkbrev::DatabasePaths::new(db.path(), keysymdef());

    let mut loader = Loader::open(&paths).unwrap();
    let mut any_model = request("us", None, &[]);
    any_model.model = "nosuchmodel".to_string();
    assert!(loader.load(&any_model).is_ok());
}

#[test]
fn test_circular_include() {
    let db = temp_database(&[
        ("rules/base", "! model = keycodes\n  * = evdev\n\n! layout = symbols\n  * = %l\n"),
        ("keycodes/evdev", "default xkb_keycodes \"evdev\" {\n  <AE01> = 10;\n};\n"),
        (
            "symbols/loop",
            "default xkb_symbols \"a\" {\n  key <AE01> { [ 1 ] };\n  include \"loop(b)\"\n};\n\nxkb_symbols \"b\" {\n  include \"loop(a)\"\n};\n",
        ),
    ]);
    let paths = xkbrev::DatabasePaths::new(db.path(), keysymdef());

    let mut loader = Loader::open(&paths).unwrap();
    match loader.load(&request("loop", None, &[])) {
        Err(XkbError::Parse { file, line, message }) => {
            assert_eq!(file, "symbols/loop");
            assert_eq!(line, 7);
            assert!(message.contains("Circular include"), "Unexpected message: {}", message);
        }
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_missing_keysymdef() {
    let paths = xkbrev::DatabasePaths::new(xkb_root(), "/nonexistent/keysymdef.h");
    match Loader::open(&paths) {
        Err(XkbError::NotFound { kind, .. }) => assert_eq!(kind, "keysym definitions"),
        Err(other) => panic!("Expected NotFound, got {:?}", other),
        Ok(_) => panic!("Expected NotFound, got a loader"),
    }
}

#[test]
fn test_rules_given_as_path() {
    let rules = xkb_root().join("rules").join("base");
    let paths = fixture_paths().with_rules(rules.to_str().unwrap());

    let mut loader = Loader::open(&paths).unwrap();
    let components = loader.components(&request("us", Some("dvp"), &[])).unwrap();
    assert_eq!(components.keycodes, "xfree86");
    assert_eq!(components.types, "complete");
    assert_eq!(components.symbols, "pc+us(dvp)+inet(evdev)");
    assert!(loader.load(&request("us", Some("dvp"), &[])).is_ok());
}
