use crate::derive_utils::apply_derives;
use crate::field_utils::{ensure_leading_fields, field_type};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, LitStr, Result, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[entity] 宏实现
/// - `id` 字段：已存在则沿用其类型并移至最前；否则按 `id = Type`（默认 `String`）追加
/// - `type = "..."`：实体类型名，默认取结构体名
/// - `debug = false`：不派生 Debug，便于用户自定义实现
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_type: Type = match (field_type(fields_named, "id"), cfg.id_ty) {
        (Some(existing), Some(configured)) if quote!(#existing).to_string() != quote!(#configured).to_string() => {
            return syn::Error::new(
                configured.span(),
                "'id' type in attribute differs from the declared `id` field",
            )
            .to_compile_error()
            .into();
        }
        (Some(existing), _) => existing.clone(),
        (None, Some(configured)) => configured,
        (None, None) => syn::parse_quote! { String },
    };

    ensure_leading_fields(fields_named, &[("id", &id_type)]);

    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if cfg.derive_debug.unwrap_or(true) {
        required.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;
    let type_name = cfg
        .type_name
        .map(|lit| lit.value())
        .unwrap_or_else(|| ident.to_string());
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let expanded = quote! {
        #st

        impl #impl_generics ::reactor_core::entity::Entity for #ident #ty_generics #where_clause {
            type Id = #id_type;

            const TYPE: &'static str = #type_name;

            fn id(&self) -> &Self::Id { &self.id }
        }
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

struct EntityAttrConfig {
    type_name: Option<LitStr>,
    id_ty: Option<Type>,
    derive_debug: Option<bool>,
}

impl Parse for EntityAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = Self {
            type_name: None,
            id_ty: None,
            derive_debug: None,
        };

        let elems: Punctuated<EntityAttrElem, Token![,]> =
            Punctuated::<EntityAttrElem, Token![,]>::parse_terminated(input)?;

        for elem in elems {
            match elem {
                EntityAttrElem::Type(lit) => {
                    if cfg.type_name.is_some() {
                        return Err(syn::Error::new(lit.span(), "duplicate key 'type' in attribute"));
                    }
                    cfg.type_name = Some(lit);
                }
                EntityAttrElem::Id(ty) => {
                    if cfg.id_ty.is_some() {
                        return Err(syn::Error::new(ty.span(), "duplicate key 'id' in attribute"));
                    }
                    cfg.id_ty = Some(*ty);
                }
                EntityAttrElem::Debug(b) => {
                    if cfg.derive_debug.is_some() {
                        return Err(syn::Error::new(
                            proc_macro2::Span::call_site(),
                            "duplicate key 'debug' in attribute",
                        ));
                    }
                    cfg.derive_debug = Some(b);
                }
            }
        }

        Ok(cfg)
    }
}

enum EntityAttrElem {
    Type(LitStr),
    Id(Box<Type>),
    Debug(bool),
}

impl Parse for EntityAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        if input.peek(Token![type]) {
            let _kw: Token![type] = input.parse()?;
            let _eq: Token![=] = input.parse()?;
            return Ok(EntityAttrElem::Type(input.parse()?));
        }

        let key: syn::Ident = input.parse()?;
        if key == "id" {
            let _eq: Token![=] = input.parse()?;
            let ty: Type = input.parse()?;
            Ok(EntityAttrElem::Id(Box::new(ty)))
        } else if key == "debug" {
            let _eq: Token![=] = input.parse()?;
            let expr: syn::Expr = input.parse()?;
            match expr {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Bool(b),
                    ..
                }) => Ok(EntityAttrElem::Debug(b.value())),
                other => Err(syn::Error::new(
                    other.span(),
                    "expected boolean literal for 'debug'",
                )),
            }
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'type', 'id' or 'debug'",
            ))
        }
    }
}
