//! Shared program fixtures for integration tests.
//!
//! `billing_fixture` assembles a small but representative host compilation:
//! an `Invoice` class with members and aspect attributes, an inheritance
//! chain with an interface, and a generic collection type.

#![allow(dead_code)]

use std::sync::Arc;

use weft::base::{Location, Span, SymbolId};
use weft::host::{AttributeData, ConstValue, HostCompilation, ProgramBuilder};
use weft::model::CompilationModel;

pub struct BillingFixture {
    pub host: Arc<HostCompilation>,
    /// `Acme.Billing`
    pub ns: SymbolId,
    /// `class Invoice`
    pub invoice: SymbolId,
    /// `class AuditedInvoice : Invoice, IAudit`
    pub audited: SymbolId,
    /// `interface IAudit`
    pub iaudit: SymbolId,
    /// `void Add(double amount)` with `[Log(Level = 2)]`
    pub add_method: SymbolId,
    /// `static bool Validate()` with `[Log]`
    pub validate_method: SymbolId,
    /// `double Total()` with a local function `Round`
    pub total_method: SymbolId,
    /// `string Number { get; set; }`
    pub number_property: SymbolId,
    /// `double total;`
    pub total_field: SymbolId,
    /// `Invoice()` constructor
    pub ctor: SymbolId,
    /// `class Acme.Aspects.LogAttribute`
    pub log_attr: SymbolId,
    /// `class Acme.Aspects.IntroduceAttribute`
    pub introduce_attr: SymbolId,
    /// `class Acme.Collections.List<T>`
    pub list: SymbolId,
}

pub fn billing_fixture() -> BillingFixture {
    let mut p = ProgramBuilder::new();

    let aspects_ns = p.namespace("Acme.Aspects");
    let log_attr = p.class(aspects_ns, "LogAttribute");
    let log_attr_ty = p.named_type(log_attr);
    let introduce_attr = p.class(aspects_ns, "IntroduceAttribute");

    let ns = p.namespace("Acme.Billing");
    let iaudit = p.interface(ns, "IAudit");
    let iaudit_ty = p.named_type(iaudit);

    let invoice = p.class(ns, "Invoice");
    let invoice_ty = p.named_type(invoice);
    let double_ty = p.double_ty();
    let string_ty = p.string_ty();
    let bool_ty = p.bool_ty();
    let void_ty = p.void_ty();

    let ctor = p.constructor(invoice);
    let total_field = p.field(invoice, "total", double_ty);
    let number_property = p.property(invoice, "Number", string_ty);

    let add_method = p.method(invoice, "Add", void_ty);
    p.param(add_method, "amount", double_ty);
    p.attribute(
        add_method,
        AttributeData::new(log_attr_ty)
            .with_named("Level", ConstValue::Int(2))
            .with_location(Location::new("Invoice.cs", Span::point(10, 4))),
    );

    let validate_method = p.method(invoice, "Validate", bool_ty);
    p.set_static(validate_method, true);
    p.attribute(
        validate_method,
        AttributeData::new(log_attr_ty)
            .with_location(Location::new("Invoice.cs", Span::point(24, 4))),
    );

    let total_method = p.method(invoice, "Total", double_ty);
    p.local_function(total_method, "Round", double_ty);

    let audited = p.class(ns, "AuditedInvoice");
    p.set_base(audited, invoice_ty);
    p.add_interface(audited, iaudit_ty);

    let collections_ns = p.namespace("Acme.Collections");
    let list = p.class(collections_ns, "List");
    p.generic_param(list, "T");

    BillingFixture {
        host: Arc::new(p.finish()),
        ns,
        invoice,
        audited,
        iaudit,
        add_method,
        validate_method,
        total_method,
        number_property,
        total_field,
        ctor,
        log_attr,
        introduce_attr,
        list,
    }
}

pub fn fresh_model(fixture: &BillingFixture) -> CompilationModel {
    CompilationModel::fresh(Arc::clone(&fixture.host)).expect("fresh model")
}
