use quote::{ToTokens, format_ident};
use std::collections::HashSet;
use syn::punctuated::Punctuated;
use syn::{Attribute, Field, FieldsNamed, Token, Type};

pub(crate) fn is_field(field: &Field, name: &str) -> bool {
    field.ident.as_ref().is_some_and(|i| i == name)
}

pub(crate) fn has_field(fields: &FieldsNamed, name: &str) -> bool {
    fields.named.iter().any(|f| is_field(f, name))
}

fn new_field(name: &str, ty: &Type) -> Field {
    let ident = format_ident!("{}", name);
    syn::parse_quote! { #ident: #ty }
}

/// 把所需字段按给定顺序放到最前：已存在则沿用原定义，缺失则新建
pub(crate) fn hoist_fields(fields: &mut FieldsNamed, required: &[(&str, Type)]) {
    let old = std::mem::take(&mut fields.named);
    let mut named: Punctuated<Field, Token![,]> = Punctuated::new();

    for (name, ty) in required {
        match old.iter().find(|f| is_field(f, name)) {
            Some(existing) => named.push(existing.clone()),
            None => named.push(new_field(name, ty)),
        }
    }

    for f in old {
        if !required.iter().any(|(name, _)| is_field(&f, name)) {
            named.push(f);
        }
    }

    fields.named = named;
}

/// 仅补齐缺失字段（置于最前），已有字段保持原顺序
pub(crate) fn prepend_missing_fields(fields: &mut FieldsNamed, required: &[(&str, Type)]) {
    let mut named: Punctuated<Field, Token![,]> = required
        .iter()
        .filter(|(name, _)| !has_field(fields, name))
        .map(|(name, ty)| new_field(name, ty))
        .collect();
    named.extend(std::mem::take(&mut fields.named));
    fields.named = named;
}

// Serialize 与 serde::Serialize 视为同一个派生
fn derive_key(path: &syn::Path) -> String {
    path.segments
        .last()
        .map(|s| s.ident.to_string())
        .unwrap_or_else(|| path.to_token_stream().to_string())
}

/// 合并默认派生与已有 `#[derive]`，去重后收敛为一个属性
pub(crate) fn merge_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) -> syn::Result<()> {
    let mut existing = Vec::new();
    let mut retained = Vec::new();
    for attr in attrs.drain(..) {
        if attr.path().is_ident("derive") {
            let list = attr.parse_args_with(
                Punctuated::<syn::Path, Token![,]>::parse_terminated,
            )?;
            existing.extend(list);
        } else {
            retained.push(attr);
        }
    }

    let mut seen = HashSet::new();
    let derives: Vec<syn::Path> = required
        .into_iter()
        .chain(existing)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();

    attrs.push(syn::parse_quote!(#[derive(#(#derives),*)]));
    attrs.extend(retained);
    Ok(())
}
