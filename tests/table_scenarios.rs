//! End-to-end scenarios for the table storage core: inserts with index
//! enforcement, growth, MVCC deletes, updates, and reorganization.

use std::sync::Arc;

use tilestore::catalog::{
    Column, DatabaseId, IndexId, RowGroupDirectory, Schema, TableId,
};
use tilestore::datum::{Type, Value};
use tilestore::index::{Index, IndexConstraint, IndexMetadata};
use tilestore::rowgroup::{ColumnMap, ItemPointer};
use tilestore::storage::MemoryBackend;
use tilestore::table::{Table, TableError};
use tilestore::tuple::Tuple;
use tilestore::tx::{Transaction, TransactionManager};

fn account_schema() -> Schema {
    Schema::new(vec![
        Column::new("id", Type::Int4, false),
        Column::new("name", Type::Varchar, true),
    ])
}

fn table_with_pk(tuples_per_row_group: usize) -> Table {
    let table = Table::new(
        DatabaseId::new(1),
        TableId::new(1),
        "accounts",
        account_schema(),
        tuples_per_row_group,
        Arc::new(RowGroupDirectory::new()),
        Arc::new(MemoryBackend::new()),
    );
    table.add_index(Arc::new(Index::new(IndexMetadata::new(
        "pk_accounts",
        IndexId::new(1),
        IndexConstraint::PrimaryKey,
        vec![0],
        vec![Column::new("id", Type::Int4, false)],
    ))));
    table
}

fn row(id: i32, name: &str) -> Tuple {
    Tuple::new(vec![Value::Int32(id), Value::Text(name.into())])
}

fn key(id: i32) -> Tuple {
    Tuple::new(vec![Value::Int32(id)])
}

/// Commits an insert the way the engine above this crate would: mint a
/// commit id and finalize the slot's header.
fn commit_insert(
    table: &Table,
    manager: &TransactionManager,
    txn: &Transaction,
    ptr: ItemPointer,
) {
    let cid = manager.commit(txn);
    table
        .directory()
        .lookup(ptr.row_group)
        .unwrap()
        .header()
        .commit_insert(ptr.offset, cid);
}

fn commit_delete(
    table: &Table,
    manager: &TransactionManager,
    txn: &Transaction,
    ptr: ItemPointer,
) {
    let cid = manager.commit(txn);
    table
        .directory()
        .lookup(ptr.row_group)
        .unwrap()
        .header()
        .commit_delete(ptr.offset, cid);
}

#[test]
fn test_single_insert_read_back() {
    let table = table_with_pk(4);
    let manager = TransactionManager::new();
    let tx1 = manager.begin();

    let ptr = table.insert_tuple(&tx1, &row(1, "a")).unwrap();

    assert_eq!(table.get_row_count(), 1);
    assert_eq!(table.row_group_count(), 1);

    let index = table.get_index_by_offset(0).unwrap();
    let locations = index.scan(&key(1));
    assert_eq!(locations, vec![ptr]);

    let group = table.directory().lookup(ptr.row_group).unwrap();
    assert!(group.is_visible(ptr.offset, tx1.transaction_id(), tx1.last_commit_id()));
    assert_eq!(group.value(ptr.offset, 0), Value::Int32(1));
    assert_eq!(group.value(ptr.offset, 1), Value::Text("a".into()));
}

#[test]
fn test_growth_on_fill() {
    let table = table_with_pk(2);
    let manager = TransactionManager::new();
    let txn = manager.begin();

    let p1 = table.insert_tuple(&txn, &row(1, "a")).unwrap();
    let p2 = table.insert_tuple(&txn, &row(2, "b")).unwrap();
    let p3 = table.insert_tuple(&txn, &row(3, "c")).unwrap();

    assert_eq!(table.row_group_count(), 2);
    // First two tuples in the first row group, third in the second
    let first = table.row_group(0).unwrap().id();
    let second = table.row_group(1).unwrap().id();
    assert_eq!(p1.row_group, first);
    assert_eq!(p2.row_group, first);
    assert_eq!(p3.row_group, second);
    assert_eq!(table.get_row_count(), 3);
}

#[test]
fn test_unique_violation_on_visible_entry() {
    let table = table_with_pk(4);
    let manager = TransactionManager::new();

    let tx1 = manager.begin();
    let ptr = table.insert_tuple(&tx1, &row(1, "a")).unwrap();
    commit_insert(&table, &manager, &tx1, ptr);

    let tx2 = manager.begin();
    let err = table.insert_tuple(&tx2, &row(1, "b")).unwrap_err();
    assert!(matches!(err, TableError::UniqueViolation { .. }));

    assert_eq!(table.get_row_count(), 1);
    // The slot is nonetheless consumed
    assert_eq!(table.row_group(0).unwrap().next_slot(), 2);
    // The index holds exactly one pointer for the key
    let index = table.get_index_by_offset(0).unwrap();
    assert_eq!(index.scan(&key(1)), vec![ptr]);
}

#[test]
fn test_delete_then_reinsert() {
    let table = table_with_pk(4);
    let manager = TransactionManager::new();

    let tx1 = manager.begin();
    let old_ptr = table.insert_tuple(&tx1, &row(5, "x")).unwrap();
    commit_insert(&table, &manager, &tx1, old_ptr);
    assert_eq!(table.get_row_count(), 1);

    let tx_del = manager.begin();
    assert!(table.delete_tuple(&tx_del, old_ptr));
    commit_delete(&table, &manager, &tx_del, old_ptr);
    assert_eq!(table.get_row_count(), 0);

    let tx2 = manager.begin();
    let new_ptr = table.insert_tuple(&tx2, &row(5, "y")).unwrap();
    assert_eq!(table.get_row_count(), 1);

    // Only the new pointer is visible to tx2
    let group = table.directory().lookup(old_ptr.row_group).unwrap();
    assert!(!group.is_visible(
        old_ptr.offset,
        tx2.transaction_id(),
        tx2.last_commit_id()
    ));
    assert!(group.is_visible(
        new_ptr.offset,
        tx2.transaction_id(),
        tx2.last_commit_id()
    ));
}

#[test]
fn test_same_key_update() {
    let table = table_with_pk(4);
    let manager = TransactionManager::new();

    let tx1 = manager.begin();
    let old_ptr = table.insert_tuple(&tx1, &row(7, "p")).unwrap();
    commit_insert(&table, &manager, &tx1, old_ptr);

    let tx2 = manager.begin();
    assert!(table.delete_tuple(&tx2, old_ptr));
    let new_ptr = table.update_tuple(&tx2, &row(7, "q")).unwrap();

    assert_ne!(new_ptr, old_ptr);
    // Old slot is marked deleted for its deleter
    let group = table.directory().lookup(old_ptr.row_group).unwrap();
    assert!(!group.is_visible(
        old_ptr.offset,
        tx2.transaction_id(),
        tx2.last_commit_id()
    ));
    // The index now points the key at the new version
    let index = table.get_index_by_offset(0).unwrap();
    assert_eq!(index.scan(&key(7)), vec![new_ptr]);
    assert_eq!(
        group.value(new_ptr.offset, 1),
        Value::Text("q".into())
    );
}

#[test]
fn test_row_group_reorganization() {
    let table = table_with_pk(4);
    let manager = TransactionManager::new();
    let txn = manager.begin();

    let mut pointers = Vec::new();
    for i in 0..4 {
        let ptr = table.insert_tuple(&txn, &row(i, &format!("n{}", i))).unwrap();
        commit_insert(&table, &manager, &txn, ptr);
        pointers.push(ptr);
    }
    let group_id = pointers[0].row_group;

    let transformed = table
        .transform_row_group(group_id, ColumnMap::new(vec![(0, 0), (1, 0)]), true)
        .unwrap();

    // Directory lookup returns the transformed group
    let resolved = table.directory().lookup(group_id).unwrap();
    assert!(Arc::ptr_eq(&resolved, &transformed));
    assert_eq!(transformed.tile_count(), 2);

    // Values and visibility preserved; stale index pointers still resolve
    let reader = manager.begin();
    for (i, ptr) in pointers.iter().enumerate() {
        assert!(transformed.is_visible(
            ptr.offset,
            reader.transaction_id(),
            reader.last_commit_id()
        ));
        assert_eq!(transformed.value(ptr.offset, 0), Value::Int32(i as i32));
        assert_eq!(
            transformed.value(ptr.offset, 1),
            Value::Text(format!("n{}", i))
        );
    }

    // Index pointers survive the rewrite untouched
    let index = table.get_index_by_offset(0).unwrap();
    for (i, ptr) in pointers.iter().enumerate() {
        assert_eq!(index.scan(&key(i as i32)), vec![*ptr]);
    }
    // Reorganization does not change the row count
    assert_eq!(table.get_row_count(), 4);
}

#[test]
fn test_round_trip_across_all_indexes() {
    let table = table_with_pk(4);
    table.add_index(Arc::new(Index::new(IndexMetadata::new(
        "idx_name",
        IndexId::new(2),
        IndexConstraint::NonUnique,
        vec![1],
        vec![Column::new("name", Type::Varchar, true)],
    ))));

    let manager = TransactionManager::new();
    let txn = manager.begin();
    let tuple = row(3, "carol");
    let ptr = table.insert_tuple(&txn, &tuple).unwrap();

    for offset in 0..table.index_count() {
        let index = table.get_index_by_offset(offset).unwrap();
        let locations = index.scan(&index.key_for(&tuple));
        assert!(
            locations.contains(&ptr),
            "index {} lost the pointer",
            index.name()
        );
    }
}

#[test]
fn test_deletes_do_not_touch_indexes() {
    let table = table_with_pk(4);
    let manager = TransactionManager::new();

    let tx1 = manager.begin();
    let ptr = table.insert_tuple(&tx1, &row(1, "a")).unwrap();
    commit_insert(&table, &manager, &tx1, ptr);

    let tx2 = manager.begin();
    assert!(table.delete_tuple(&tx2, ptr));
    commit_delete(&table, &manager, &tx2, ptr);

    // The stale pointer remains in the index and is filtered by visibility
    let index = table.get_index_by_offset(0).unwrap();
    let locations = index.scan(&key(1));
    assert_eq!(locations, vec![ptr]);

    let tx3 = manager.begin();
    let group = table.directory().lookup(ptr.row_group).unwrap();
    assert!(!group.is_visible(ptr.offset, tx3.transaction_id(), tx3.last_commit_id()));
}

#[test]
fn test_insert_delete_row_count_balance() {
    let table = table_with_pk(4);
    let manager = TransactionManager::new();

    let mut pointers = Vec::new();
    for i in 0..6 {
        let txn = manager.begin();
        let ptr = table.insert_tuple(&txn, &row(i, "v")).unwrap();
        commit_insert(&table, &manager, &txn, ptr);
        pointers.push(ptr);
    }
    for ptr in pointers.iter().take(2) {
        let txn = manager.begin();
        assert!(table.delete_tuple(&txn, *ptr));
        commit_delete(&table, &manager, &txn, *ptr);
    }

    assert_eq!(table.get_row_count(), 4);
    assert!(table.is_dirty());
    table.reset_dirty();
    assert!(!table.is_dirty());
}
