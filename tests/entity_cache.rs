use catalog_admin_api::{
    error::AppError,
    models::{Actor, Role},
    store::{EntityCache, NewProduct, ProductChanges, ProductFilter, ProductOrder},
};

const ADMIN: Actor = Actor {
    user_id: 1,
    role: Role::Admin,
};
const ALICE: Actor = Actor {
    user_id: 2,
    role: Role::User,
};
const BOB: Actor = Actor {
    user_id: 3,
    role: Role::User,
};

fn product(category_id: i64, name: &str, owner: &Actor) -> NewProduct {
    NewProduct {
        category_id,
        name: name.to_string(),
        price: 10,
        colors: vec!["Red".into()],
        tags: vec![],
        owner_user_id: owner.user_id,
    }
}

fn count(cache: &EntityCache, category_id: i64) -> i64 {
    cache.category(category_id).expect("category").product_count
}

#[test]
fn category_names_are_unique_ignoring_case() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    assert_eq!(books.product_count, 0);

    assert!(matches!(
        cache.add_category(&ADMIN, "books"),
        Err(AppError::DuplicateName)
    ));
    assert!(matches!(
        cache.add_category(&ADMIN, "  BOOKS "),
        Err(AppError::DuplicateName)
    ));
    assert!(matches!(
        cache.add_category(&ADMIN, "   "),
        Err(AppError::Validation(_))
    ));
    assert_eq!(cache.list_categories().len(), 1);
}

#[test]
fn categories_list_in_insertion_order() {
    let mut cache = EntityCache::new();
    for name in ["Zeta", "Alpha", "Mid"] {
        cache.add_category(&ADMIN, name).unwrap();
    }
    let names: Vec<&str> = cache
        .list_categories()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
}

#[test]
fn category_mutations_require_admin() {
    let mut cache = EntityCache::new();
    assert!(matches!(
        cache.add_category(&ALICE, "Books"),
        Err(AppError::Forbidden)
    ));
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    assert!(matches!(
        cache.remove_category(&ALICE, books.id),
        Err(AppError::Forbidden)
    ));
    assert_eq!(cache.list_categories().len(), 1);
}

#[test]
fn removing_a_category_cascades_to_its_products() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let toys = cache.add_category(&ADMIN, "Toys").unwrap();
    for name in ["A", "B", "C"] {
        cache.add_product(&ALICE, product(books.id, name, &ALICE)).unwrap();
    }
    cache.add_product(&BOB, product(toys.id, "Yo-yo", &BOB)).unwrap();
    let before = cache.list_products(&ProductFilter::default()).len();

    let removed = cache.remove_category(&ADMIN, books.id).unwrap();

    assert_eq!(removed, 3);
    assert_eq!(
        cache.list_products(&ProductFilter::default()).len(),
        before - 3
    );
    assert!(cache.products().iter().all(|p| p.category_id != books.id));
    assert_eq!(count(&cache, toys.id), 1);
}

#[test]
fn removing_unknown_category_is_a_no_op() {
    let mut cache = EntityCache::new();
    cache.add_category(&ADMIN, "Books").unwrap();
    assert_eq!(cache.remove_category(&ADMIN, 99).unwrap(), 0);
    assert_eq!(cache.list_categories().len(), 1);
}

#[test]
fn add_product_validates_input() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();

    let mut blank = product(books.id, "  ", &ALICE);
    blank.price = 5;
    assert!(matches!(cache.add_product(&ALICE, blank), Err(AppError::Validation(_))));

    let mut free = product(books.id, "Free", &ALICE);
    free.price = 0;
    assert!(matches!(cache.add_product(&ALICE, free), Err(AppError::Validation(_))));

    let mut colorless = product(books.id, "Plain", &ALICE);
    colorless.colors = vec![" ".into()];
    assert!(matches!(
        cache.add_product(&ALICE, colorless),
        Err(AppError::Validation(_))
    ));

    assert!(matches!(
        cache.add_product(&ALICE, product(404, "Lost", &ALICE)),
        Err(AppError::Validation(_))
    ));

    assert!(cache.products().is_empty());
    assert_eq!(count(&cache, books.id), 0);
}

#[test]
fn product_name_is_unique_per_category_ignoring_case() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let toys = cache.add_category(&ADMIN, "Toys").unwrap();
    cache.add_product(&ALICE, product(books.id, "Dune", &ALICE)).unwrap();

    assert!(matches!(
        cache.add_product(&BOB, product(books.id, "DUNE", &BOB)),
        Err(AppError::DuplicateProduct)
    ));
    cache
        .add_product(&BOB, product(toys.id, "Dune", &BOB))
        .expect("same name in another category is fine");
    assert_eq!(count(&cache, books.id), 1);
    assert_eq!(count(&cache, toys.id), 1);
}

#[test]
fn colors_and_tags_are_deduplicated_in_order() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let mut new = product(books.id, "Dune", &ALICE);
    new.colors = vec!["Red".into(), "Blue".into(), "Red".into()];
    new.tags = vec!["scifi".into(), " classic ".into(), "scifi".into(), "".into()];

    let created = cache.add_product(&ALICE, new).unwrap();
    assert_eq!(created.colors, ["Red", "Blue"]);
    assert_eq!(created.tags, ["scifi", "classic"]);
}

#[test]
fn price_only_update_leaves_counts_alone() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let created = cache.add_product(&ALICE, product(books.id, "Dune", &ALICE)).unwrap();

    let updated = cache
        .update_product(
            &ALICE,
            created.id,
            ProductChanges {
                price: Some(25),
                ..ProductChanges::default()
            },
        )
        .unwrap();

    assert_eq!(updated.price, 25);
    assert_eq!(updated.name, "Dune");
    assert_eq!(count(&cache, books.id), 1);
}

#[test]
fn update_to_own_values_is_not_a_duplicate() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let created = cache.add_product(&ALICE, product(books.id, "Dune", &ALICE)).unwrap();

    cache
        .update_product(
            &ALICE,
            created.id,
            ProductChanges {
                name: Some("dune".into()),
                category_id: Some(books.id),
                ..ProductChanges::default()
            },
        )
        .expect("renaming to itself is allowed");
}

#[test]
fn moving_category_shifts_counts() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let toys = cache.add_category(&ADMIN, "Toys").unwrap();
    let created = cache.add_product(&ALICE, product(books.id, "Dune", &ALICE)).unwrap();

    cache
        .update_product(
            &ALICE,
            created.id,
            ProductChanges {
                category_id: Some(toys.id),
                ..ProductChanges::default()
            },
        )
        .unwrap();

    assert_eq!(count(&cache, books.id), 0);
    assert_eq!(count(&cache, toys.id), 1);
}

#[test]
fn update_failures_leave_record_untouched() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let dune = cache.add_product(&ALICE, product(books.id, "Dune", &ALICE)).unwrap();
    cache.add_product(&ALICE, product(books.id, "Emma", &ALICE)).unwrap();

    assert!(matches!(
        cache.update_product(&ALICE, 999, ProductChanges::default()),
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        cache.update_product(
            &ALICE,
            dune.id,
            ProductChanges {
                name: Some("EMMA".into()),
                ..ProductChanges::default()
            }
        ),
        Err(AppError::DuplicateProduct)
    ));
    assert!(matches!(
        cache.update_product(
            &ALICE,
            dune.id,
            ProductChanges {
                category_id: Some(77),
                price: Some(99),
                ..ProductChanges::default()
            }
        ),
        Err(AppError::Validation(_))
    ));
    assert_eq!(cache.product(dune.id), Some(&dune));
    assert_eq!(count(&cache, books.id), 2);
}

#[test]
fn only_owner_or_admin_may_change_a_product() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let dune = cache.add_product(&ALICE, product(books.id, "Dune", &ALICE)).unwrap();

    let raise = ProductChanges {
        price: Some(50),
        ..ProductChanges::default()
    };
    assert!(matches!(
        cache.update_product(&BOB, dune.id, raise.clone()),
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        cache.remove_product(&BOB, dune.id),
        Err(AppError::Forbidden)
    ));
    assert!(cache.update_product(&ADMIN, dune.id, raise).is_ok());

    assert!(matches!(
        cache.add_product(&BOB, product(books.id, "Emma", &ALICE)),
        Err(AppError::Forbidden)
    ));
    let filed = cache
        .add_product(&ADMIN, product(books.id, "Emma", &ALICE))
        .expect("admin may file on behalf of another user");
    assert_eq!(filed.owner_user_id, ALICE.user_id);
}

#[test]
fn remove_product_adjusts_count_and_ignores_unknown_ids() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let dune = cache.add_product(&ALICE, product(books.id, "Dune", &ALICE)).unwrap();

    assert_eq!(cache.remove_product(&ALICE, dune.id).unwrap(), Some(dune.clone()));
    assert_eq!(count(&cache, books.id), 0);
    assert_eq!(cache.remove_product(&ALICE, dune.id).unwrap(), None);
    assert_eq!(count(&cache, books.id), 0);
}

#[test]
fn list_products_filters_and_sorts() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let toys = cache.add_category(&ADMIN, "Toys").unwrap();

    let mut dune = product(books.id, "Dune", &ALICE);
    dune.price = 30;
    dune.tags = vec!["SciFi".into()];
    let mut emma = product(books.id, "Emma", &BOB);
    emma.price = 10;
    let mut kite = product(toys.id, "Kite", &ALICE);
    kite.price = 20;
    for p in [dune, emma, kite] {
        let owner = Actor::new(p.owner_user_id, Role::User);
        cache.add_product(&owner, p).unwrap();
    }

    let names = |filter: ProductFilter| -> Vec<String> {
        cache
            .list_products(&filter)
            .into_iter()
            .map(|p| p.name.clone())
            .collect()
    };

    assert_eq!(names(ProductFilter::default()), ["Dune", "Emma", "Kite"]);
    assert_eq!(
        names(ProductFilter {
            category_id: Some(books.id),
            ..ProductFilter::default()
        }),
        ["Dune", "Emma"]
    );
    assert_eq!(
        names(ProductFilter {
            owner_user_id: Some(ALICE.user_id),
            ..ProductFilter::default()
        }),
        ["Dune", "Kite"]
    );
    assert_eq!(
        names(ProductFilter {
            q: Some("scifi".into()),
            ..ProductFilter::default()
        }),
        ["Dune"]
    );
    assert_eq!(
        names(ProductFilter {
            min_price: Some(15),
            max_price: Some(25),
            ..ProductFilter::default()
        }),
        ["Kite"]
    );
    assert_eq!(
        names(ProductFilter {
            order: ProductOrder::Price,
            descending: true,
            ..ProductFilter::default()
        }),
        ["Dune", "Kite", "Emma"]
    );
}

#[test]
fn ids_continue_after_reload() {
    let mut cache = EntityCache::new();
    let books = cache.add_category(&ADMIN, "Books").unwrap();
    let dune = cache.add_product(&ALICE, product(books.id, "Dune", &ALICE)).unwrap();

    let mut reloaded = EntityCache::from_records(
        cache.list_categories().to_vec(),
        cache.products().to_vec(),
    );
    let toys = reloaded.add_category(&ADMIN, "Toys").unwrap();
    let emma = reloaded
        .add_product(&ALICE, product(books.id, "Emma", &ALICE))
        .unwrap();
    assert!(toys.id > books.id);
    assert!(emma.id > dune.id);
}
