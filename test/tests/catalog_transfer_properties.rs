use brisk_server::ServerConfig;
use brisk_shared::{AssetCatalog, Platform};
use brisk_test::Harness;
use proptest::prelude::*;

fn catalog_from(names: &[String], blob: &[u8]) -> AssetCatalog {
    let mut catalog = AssetCatalog::new();
    for name in names {
        catalog.register_asset(name);
    }
    if !blob.is_empty() {
        catalog.set_blob(Platform::LINUX, blob.to_vec());
    }
    catalog
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn client_mirrors_any_catalog(
        names in prop::collection::btree_set("[A-Za-z][A-Za-z0-9_]{0,15}", 1..40),
        blob in prop::collection::vec(any::<u8>(), 0..6_000),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let catalog = catalog_from(&names, &blob);
        let mut harness = Harness::with_catalog(ServerConfig::default(), catalog);
        harness.add_client();
        harness.run_until_ready();

        let client = &harness.clients[0];
        prop_assert_eq!(client.catalog().len(), names.len());
        for (index, name) in names.iter().enumerate() {
            let id = index as u32 + 1;
            prop_assert_eq!(client.catalog().name(id), name.as_str());
            prop_assert_eq!(client.asset_id(name).value(), id);
        }
        prop_assert_eq!(client.asset_blob(), blob.as_slice());
    }
}
